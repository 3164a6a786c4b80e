//! CPF and field validation helpers.

/// Keeps only ASCII digits.
pub fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Checks length, repeated digits and both check digits of a CPF.
///
/// Punctuation is ignored, so `529.982.247-25` and `52998224725` are both
/// accepted.
pub fn validate_cpf(cpf: &str) -> bool {
    let digits: Vec<u32> = digits_only(cpf)
        .chars()
        .filter_map(|c| c.to_digit(10))
        .collect();

    if digits.len() != 11 {
        return false;
    }

    if digits.iter().all(|d| *d == digits[0]) {
        return false;
    }

    check_digit(&digits[..9]) == digits[9] && check_digit(&digits[..10]) == digits[10]
}

fn check_digit(prefix: &[u32]) -> u32 {
    let weight_start = prefix.len() as u32 + 1;
    let sum: u32 = prefix
        .iter()
        .enumerate()
        .map(|(i, d)| d * (weight_start - i as u32))
        .sum();
    match sum % 11 {
        r if r < 2 => 0,
        r => 11 - r,
    }
}

/// Formats a CPF as `XXX.XXX.XXX-XX`. Inputs without 11 digits are returned
/// as their digits.
pub fn format_cpf(cpf: &str) -> String {
    let digits = digits_only(cpf);
    if digits.len() != 11 {
        return digits;
    }
    format!(
        "{}.{}.{}-{}",
        &digits[..3],
        &digits[3..6],
        &digits[6..9],
        &digits[9..]
    )
}

/// Two ASCII letters, compared after upper-casing.
pub fn is_valid_uf(uf: &str) -> bool {
    uf.len() == 2 && uf.chars().all(|c| c.is_ascii_alphabetic())
}

pub fn is_valid_sexo(sexo: &str) -> bool {
    matches!(sexo, "M" | "F")
}

/// Loose shape check: one `@` with text on both sides and a dot in the domain.
pub fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_cpf() {
        assert!(validate_cpf("529.982.247-25"));
        assert!(validate_cpf("52998224725"));
        assert!(validate_cpf("111.444.777-35"));
    }

    #[test]
    fn test_invalid_cpf() {
        assert!(!validate_cpf("529.982.247-24"));
        assert!(!validate_cpf("111.111.111-11"));
        assert!(!validate_cpf("1234567890"));
        assert!(!validate_cpf(""));
    }

    #[test]
    fn test_format_cpf() {
        assert_eq!(format_cpf("52998224725"), "529.982.247-25");
        assert_eq!(format_cpf("529.982.247-25"), "529.982.247-25");
        assert_eq!(format_cpf("12-34"), "1234");
    }

    #[test]
    fn test_uf_and_sexo() {
        assert!(is_valid_uf("SP"));
        assert!(!is_valid_uf("S"));
        assert!(!is_valid_uf("S1"));
        assert!(is_valid_sexo("F"));
        assert!(!is_valid_sexo("X"));
    }

    #[test]
    fn test_email() {
        assert!(is_valid_email("maria@example.com"));
        assert!(!is_valid_email("maria.example.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("maria@localhost"));
    }
}
