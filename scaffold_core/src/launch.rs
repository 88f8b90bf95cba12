//! # Launch Parameters
//!
//! The calculator is opened from a bot link or a payment redirect, which
//! carry the access token (or the data to obtain one) in the query string:
//!
//! ```text
//! https://calc.example.ru/?token=abc123
//! https://calc.example.ru/?userId=42&paymentId=pay-7
//! https://calc.example.ru/?error=payment_cancelled
//! ```
//!
//! [`LaunchUrl::parse`] extracts those parameters and computes the cleaned
//! URL (query and fragment removed) that the front end shows afterwards.

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Query parameters the calculator understands. Empty values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchParams {
    pub token: Option<String>,
    pub user_id: Option<String>,
    pub payment_id: Option<String>,
    pub error: Option<String>,
}

/// What mount has to do about the access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    /// Token handed over directly
    Direct(String),
    /// Payment redirect: exchange the ids for a token
    Payment { user_id: String, payment_id: String },
    /// Nothing in the URL; fall back to storage
    Stored,
}

impl LaunchParams {
    /// Collect parameters from decoded key/value pairs. Later duplicates win.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut params = LaunchParams::default();
        for (key, value) in pairs {
            let value = value.as_ref().trim();
            if value.is_empty() {
                continue;
            }
            let slot = match key.as_ref() {
                "token" => &mut params.token,
                "userId" => &mut params.user_id,
                "paymentId" => &mut params.payment_id,
                "error" => &mut params.error,
                _ => continue,
            };
            *slot = Some(value.to_string());
        }
        params
    }

    /// A direct token wins over a payment pair; a half pair is ignored.
    pub fn token_source(&self) -> TokenSource {
        if let Some(token) = &self.token {
            return TokenSource::Direct(token.clone());
        }
        match (&self.user_id, &self.payment_id) {
            (Some(user_id), Some(payment_id)) => TokenSource::Payment {
                user_id: user_id.clone(),
                payment_id: payment_id.clone(),
            },
            _ => TokenSource::Stored,
        }
    }

    /// True when any recognised parameter was present
    pub fn is_empty(&self) -> bool {
        self.token.is_none() && self.user_id.is_none() && self.payment_id.is_none() && self.error.is_none()
    }
}

/// A parsed launch URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchUrl {
    pub params: LaunchParams,
    /// The URL with query and fragment stripped
    pub cleaned: String,
}

impl LaunchUrl {
    pub fn parse(url: &str) -> CalcResult<Self> {
        let mut parsed = reqwest::Url::parse(url)
            .map_err(|e| CalcError::invalid_input("url", url, e.to_string()))?;

        let params = LaunchParams::from_pairs(parsed.query_pairs());

        parsed.set_query(None);
        parsed.set_fragment(None);

        Ok(LaunchUrl {
            params,
            cleaned: parsed.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_token() {
        let launch = LaunchUrl::parse("https://calc.example.ru/app/?token=abc%20123&x=1").unwrap();
        assert_eq!(launch.params.token.as_deref(), Some("abc 123"));
        assert_eq!(launch.params.token_source(), TokenSource::Direct("abc 123".into()));
        assert_eq!(launch.cleaned, "https://calc.example.ru/app/");
    }

    #[test]
    fn test_payment_pair() {
        let launch = LaunchUrl::parse("http://localhost:3000/?userId=42&paymentId=pay-7").unwrap();
        assert_eq!(
            launch.params.token_source(),
            TokenSource::Payment {
                user_id: "42".into(),
                payment_id: "pay-7".into()
            }
        );
    }

    #[test]
    fn test_token_beats_payment_pair() {
        let params = LaunchParams::from_pairs([("userId", "1"), ("paymentId", "2"), ("token", "t")]);
        assert_eq!(params.token_source(), TokenSource::Direct("t".into()));
    }

    #[test]
    fn test_half_pair_and_empty_values_are_ignored() {
        let params = LaunchParams::from_pairs([("userId", "1"), ("token", "  ")]);
        assert_eq!(params.token, None);
        assert_eq!(params.token_source(), TokenSource::Stored);
    }

    #[test]
    fn test_plain_url_has_no_params() {
        let launch = LaunchUrl::parse("https://calc.example.ru/").unwrap();
        assert!(launch.params.is_empty());
        assert_eq!(launch.cleaned, "https://calc.example.ru/");
    }

    #[test]
    fn test_error_param() {
        let launch = LaunchUrl::parse("https://calc.example.ru/?error=%D0%9E%D0%BF%D0%BB%D0%B0%D1%82%D0%B0").unwrap();
        assert_eq!(launch.params.error.as_deref(), Some("Оплата"));
    }

    #[test]
    fn test_relative_url_is_rejected() {
        assert!(LaunchUrl::parse("/?token=abc").is_err());
    }
}
