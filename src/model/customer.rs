use super::ids::CustomerId;
use crate::customer_actor::CustomerError;
use serde::{Deserialize, Serialize};

/// A registered customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub customer_id: CustomerId,
    pub full_name: String,
    pub phone_number: String,
}

/// Payload to register a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerCreate {
    pub full_name: String,
    pub phone_number: String,
}

/// Several registrations in one request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerBatch {
    pub customers: Vec<CustomerCreate>,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerUpdate {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

impl Customer {
    pub fn validate(full_name: &str, phone_number: &str) -> Result<(), CustomerError> {
        validate_full_name(full_name)?;
        validate_phone_number(phone_number)
    }
}

fn validate_full_name(full_name: &str) -> Result<(), CustomerError> {
    if full_name.trim().is_empty() {
        return Err(CustomerError::Validation("Empty fullName".into()));
    }
    if !full_name.trim().contains(' ') {
        return Err(CustomerError::Validation(
            "Must have first and last name".into(),
        ));
    }
    Ok(())
}

/// Accepts an optional leading `+`, digits and dashes, and at most one parenthesized group
/// of digits. Spaces are ignored.
fn validate_phone_number(phone_number: &str) -> Result<(), CustomerError> {
    let stripped: String = phone_number.chars().filter(|c| *c != ' ').collect();
    let body = stripped.strip_prefix('+').unwrap_or(&stripped);
    let digits_or_dashes = |s: &str| s.chars().all(|c| c.is_ascii_digit() || c == '-');

    let valid = match body.split_once('(') {
        None => digits_or_dashes(body),
        Some((head, rest)) => match rest.split_once(')') {
            Some((area, tail)) => {
                digits_or_dashes(head)
                    && !area.is_empty()
                    && area.chars().all(|c| c.is_ascii_digit())
                    && digits_or_dashes(tail)
            }
            None => false,
        },
    };
    if valid {
        Ok(())
    } else {
        Err(CustomerError::Validation(format!(
            "{phone_number} is not a valid phone number"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_needs_first_and_last() {
        assert!(Customer::validate("Ada Lovelace", "555-1234").is_ok());
        assert!(matches!(
            Customer::validate("Ada", "555-1234"),
            Err(CustomerError::Validation(_))
        ));
        assert!(Customer::validate("   ", "555-1234").is_err());
    }

    #[test]
    fn phone_numbers() {
        for ok in ["+46 (0)70-123 45 67", "555-1234", "+1 (212) 555-0100", ""] {
            assert!(validate_phone_number(ok).is_ok(), "{ok}");
        }
        for bad in ["call me", "+46 (70", "12(34)56(78)", "()123", "++46"] {
            assert!(validate_phone_number(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn customer_wire_format() {
        let customer = Customer {
            customer_id: CustomerId(9),
            full_name: "Ada Lovelace".into(),
            phone_number: "555-1234".into(),
        };
        assert_eq!(
            serde_json::to_value(&customer).unwrap(),
            serde_json::json!({"customerId": "9", "fullName": "Ada Lovelace", "phoneNumber": "555-1234"})
        );
    }
}
