//! # Wire Types
//!
//! JSON envelopes exchanged with the calculation and payment endpoints.
//!
//! The calculation request is flat: discriminants and active numeric
//! fields side by side, token in the `Authorization` header (see
//! [`crate::client`]).
//!
//! ```json
//! { "location": "inside", "insideType": "walls", "scaffoldWidth": 1.5, "wallsLength": 36.0 }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::form::{InsideType, Location};

/// Body of `POST /api/calculate/scaffolding`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationRequest {
    pub location: Location,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inside_type: Option<InsideType>,
    /// Active numeric fields keyed by wire name
    #[serde(flatten)]
    pub fields: BTreeMap<String, f64>,
}

/// Raw calculation response. Everything but `success` may be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub formula: Option<String>,
    #[serde(default)]
    pub formula_breakdown: Option<Vec<String>>,
    #[serde(default)]
    pub coefficient: Option<Coefficient>,
    #[serde(default)]
    pub justification: Option<Justification>,
}

impl CalculationResponse {
    /// Turn the envelope into a result, or the server's complaint.
    pub fn into_result(self) -> CalcResult<CalculationResult> {
        if !self.success {
            return Err(CalcError::server_rejected(self.message));
        }

        let volume = self
            .volume
            .ok_or_else(|| CalcError::invalid_response("successful response has no volume"))?;

        Ok(CalculationResult {
            volume,
            formula: self.formula.unwrap_or_default(),
            formula_breakdown: self.formula_breakdown.unwrap_or_default(),
            coefficient: self.coefficient,
            justification: self.justification,
        })
    }
}

/// Text field the server may send as `null`
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Correction coefficient the server applied, if any
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficient {
    /// Number or preformatted string, rendered as received
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub explanation: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub formula: String,
}

impl Coefficient {
    pub fn display_value(&self) -> String {
        match &self.value {
            serde_json::Value::Null => String::new(),
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Normative reference backing the formula
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Justification {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub text: String,
}

/// A successful calculation, as shown and exported
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    /// Scaffolding area, m²
    pub volume: f64,
    pub formula: String,
    pub formula_breakdown: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coefficient: Option<Coefficient>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justification: Option<Justification>,
}

impl CalculationResult {
    /// Volume as the server sent it (no rounding)
    pub fn volume_display(&self) -> String {
        self.volume.to_string()
    }
}

/// Response of `GET /api/payment/success`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentTokenResponse {
    pub success: bool,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Message shown when the payment exchange fails without explanation
pub const TOKEN_EXCHANGE_FAILED: &str = "Не удалось получить токен доступа после оплаты.";

impl PaymentTokenResponse {
    pub fn into_token(self) -> CalcResult<String> {
        let failure = |message: Option<String>| CalcError::TokenExchangeFailed {
            message: message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| TOKEN_EXCHANGE_FAILED.to_string()),
        };

        if !self.success {
            return Err(failure(self.message));
        }

        match self.token {
            Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            _ => Err(failure(self.message)),
        }
    }
}
