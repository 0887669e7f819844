//! Observation record sent by the farm simulator.
use furrow_core::error::CoordError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Remaining stock of one investment type.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Invest {
    /// Number of objects.
    pub num: f64,

    /// Remaining useful life in years.
    pub life: f64,
}

/// State of one farm at the beginning of a simulation period.
///
/// Travels on the observation channel as a `bincode` blob.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct RlData {
    /// Rented plots per soil type, one count per remaining contract year.
    pub rest_plots_of_type: Vec<Vec<f64>>,

    /// Age of the farm.
    pub age: f64,

    /// Liquidity.
    pub liquidity: f64,

    /// Management factor.
    pub management: f64,

    /// Investments keyed by investment type.
    pub rest_invests: BTreeMap<usize, Invest>,

    /// Most recent rent paid per soil type.
    pub recent_rents: Vec<f64>,

    /// Number of farms within 10 km.
    pub nfarms_10km: f64,

    /// Free plots within 10 km per soil type.
    pub nfree_plots_10km: Vec<f64>,

    /// Average rent of new contracts per soil type.
    pub av_new_rents: Vec<f64>,
}

impl RlData {
    /// Serializes the record.
    pub fn encode(&self) -> Result<Vec<u8>, CoordError> {
        bincode::serialize(self).map_err(|e| CoordError::MalformedMessage(e.to_string()))
    }

    /// Deserializes a record received on the observation channel.
    pub fn decode(raw: &[u8]) -> Result<Self, CoordError> {
        bincode::deserialize(raw)
            .map_err(|e| CoordError::MalformedMessage(format!("observation: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncated_blob_is_malformed() {
        let data = RlData {
            rest_plots_of_type: vec![vec![1.0, 2.0, 0.0, 0.0, 0.0]],
            age: 3.0,
            recent_rents: vec![350.0],
            ..RlData::default()
        };
        let raw = data.encode().unwrap();
        assert_eq!(RlData::decode(&raw).unwrap(), data);
        assert!(matches!(
            RlData::decode(&raw[..raw.len() - 3]),
            Err(CoordError::MalformedMessage(_))
        ));
    }
}
