// src/common/validation.rs

// Validações customizadas usadas pelos payloads (validator).
// Elas só economizam idas ao servidor; o servidor valida tudo de novo.

use rust_decimal::Decimal;
use validator::ValidationError;

pub fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() && !val.is_zero() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

pub fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.add_param("exclusive_min".into(), &0.0);
        err.message = Some("O valor deve ser maior que zero.".into());
        return Err(err);
    }
    Ok(())
}

pub fn validate_not_blank(val: &str) -> Result<(), ValidationError> {
    if val.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("O campo não pode ficar em branco.".into());
        return Err(err);
    }
    Ok(())
}

// PIN do PDV: de 4 a 8 dígitos
pub fn validate_pin(val: &str) -> Result<(), ValidationError> {
    let len = val.chars().count();
    if !(4..=8).contains(&len) || !val.chars().all(|c| c.is_ascii_digit()) {
        let mut err = ValidationError::new("pin");
        err.message = Some("O PIN deve ter de 4 a 8 dígitos.".into());
        return Err(err);
    }
    Ok(())
}

pub fn is_whole_number(val: &Decimal) -> bool {
    val.fract().is_zero()
}
