//! Typed view of a saved sign-up form.

use formwork::Value;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// A customer as submitted through the sign-up form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub first_name: String,
    pub last_name: String,
    pub email_group: EmailGroup,
    pub phone: String,
    pub notification: String,
    /// `None` until a rating is picked. Numeric strings are accepted.
    #[serde(deserialize_with = "rating_from_value")]
    pub rating: Option<f64>,
    pub send_catalog: bool,
    pub addresses: Vec<Address>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailGroup {
    pub email: String,
    pub confirm_email: String,
}

/// A postal address entry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub address_type: String,
    pub street1: String,
    pub street2: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

/// Reads a rating the way the form's range check sees it: numbers and
/// numeric strings are ratings, `null` and `""` mean no rating.
fn rating_from_value<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_empty() {
        return Ok(None);
    }
    value
        .as_f64()
        .map(Some)
        .ok_or_else(|| D::Error::custom(format!("invalid rating '{}'", value)))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn customer(rating: serde_json::Value) -> serde_json::Result<Customer> {
        serde_json::from_value(json!({
            "firstName": "Jack",
            "lastName": "Harkness",
            "emailGroup": { "email": "", "confirmEmail": "" },
            "phone": "",
            "notification": "email",
            "rating": rating,
            "sendCatalog": true,
            "addresses": []
        }))
    }

    #[test]
    fn test_rating_accepts_numbers_and_numeric_strings() {
        assert_eq!(customer(json!(4)).unwrap().rating, Some(4.0));
        assert_eq!(customer(json!(2.5)).unwrap().rating, Some(2.5));
        assert_eq!(customer(json!("4")).unwrap().rating, Some(4.0));
    }

    #[test]
    fn test_rating_empty_means_none() {
        assert_eq!(customer(json!("")).unwrap().rating, None);
        assert_eq!(customer(json!(null)).unwrap().rating, None);
    }

    #[test]
    fn test_rating_rejects_text() {
        assert!(customer(json!("great")).is_err());
        assert!(customer(json!(true)).is_err());
    }
}
