//! Feature vectors of farm observations.
use crate::RlData;
use furrow_core::{error::CoordError, Flatten};
use serde::{Deserialize, Serialize};

/// Shape of the observations of a region.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ObsSchema {
    /// Number of soil types.
    pub n_soil_types: usize,

    /// Number of remaining-contract-year buckets per soil type.
    pub n_contract_years: usize,

    /// Number of investment types.
    pub n_invest_types: usize,
}

impl Default for ObsSchema {
    fn default() -> Self {
        Self {
            n_soil_types: 2,
            n_contract_years: 5,
            n_invest_types: 5,
        }
    }
}

impl ObsSchema {
    /// Length of the feature vector.
    pub fn feature_len(&self) -> usize {
        let s = self.n_soil_types;
        s * self.n_contract_years + 3 + self.n_invest_types + s + 1 + s + s
    }

    fn check_len(&self, field: &str, got: usize, expected: usize) -> Result<(), CoordError> {
        if got == expected {
            Ok(())
        } else {
            Err(CoordError::MalformedMessage(format!(
                "{}: expected {} values, got {}",
                field, expected, got
            )))
        }
    }

    /// Checks that `data` has the shape of this schema.
    pub fn validate(&self, data: &RlData) -> Result<(), CoordError> {
        let s = self.n_soil_types;
        self.check_len("rest_plots_of_type", data.rest_plots_of_type.len(), s)?;
        for plots in &data.rest_plots_of_type {
            self.check_len("rest_plots_of_type[_]", plots.len(), self.n_contract_years)?;
        }
        if let Some(k) = data.rest_invests.keys().find(|&&k| k >= self.n_invest_types) {
            return Err(CoordError::MalformedMessage(format!(
                "investment type {} out of {}",
                k, self.n_invest_types
            )));
        }
        self.check_len("recent_rents", data.recent_rents.len(), s)?;
        self.check_len("nfree_plots_10km", data.nfree_plots_10km.len(), s)?;
        self.check_len("av_new_rents", data.av_new_rents.len(), s)
    }
}

/// Decodes [`RlData`] blobs and lays them out as feature vectors.
///
/// The layout is the plot counts of every soil type, age, liquidity,
/// management, `num * life` of every investment type (zero when absent),
/// recent rents, farms within 10 km, free plots within 10 km and average
/// new rents.
#[derive(Clone, Debug, Default)]
pub struct RlDataFlattener {
    schema: ObsSchema,
}

impl RlDataFlattener {
    /// Constructs a flattener of the given schema.
    pub fn new(schema: ObsSchema) -> Self {
        Self { schema }
    }

    /// Lays out a decoded record.
    pub fn features(&self, data: &RlData) -> Result<Vec<f64>, CoordError> {
        self.schema.validate(data)?;

        let mut x = Vec::with_capacity(self.schema.feature_len());
        x.extend(data.rest_plots_of_type.iter().flatten());
        x.push(data.age);
        x.push(data.liquidity);
        x.push(data.management);

        let mut invs = vec![0.0; self.schema.n_invest_types];
        for (&k, inv) in &data.rest_invests {
            invs[k] = inv.num * inv.life;
        }
        x.extend(invs);

        x.extend(&data.recent_rents);
        x.push(data.nfarms_10km);
        x.extend(&data.nfree_plots_10km);
        x.extend(&data.av_new_rents);
        Ok(x)
    }
}

impl Flatten for RlDataFlattener {
    fn flatten(&self, raw: &[u8]) -> Result<Vec<f64>, CoordError> {
        self.features(&RlData::decode(raw)?)
    }

    fn feature_len(&self) -> Option<usize> {
        Some(self.schema.feature_len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Invest;
    use std::collections::BTreeMap;

    fn sample() -> RlData {
        RlData {
            rest_plots_of_type: vec![vec![1., 2., 0., 0., 0.], vec![0., 1., 0., 0., 0.]],
            age: 1.0,
            liquidity: 0.25,
            management: 0.5,
            rest_invests: BTreeMap::from([
                (3, Invest { num: 1.0, life: 3.0 }),
                (4, Invest { num: 2.0, life: 2.0 }),
            ]),
            recent_rents: vec![350., 200.],
            nfarms_10km: 4.0,
            nfree_plots_10km: vec![22., 12.],
            av_new_rents: vec![340., 180.],
        }
    }

    #[test]
    fn test_layout() {
        let flatten = RlDataFlattener::default();
        let x = flatten.flatten(&sample().encode().unwrap()).unwrap();
        assert_eq!(Some(x.len()), flatten.feature_len());
        assert_eq!(
            x,
            vec![
                1., 2., 0., 0., 0., 0., 1., 0., 0., 0., // plots
                1.0, 0.25, 0.5, // age, liquidity, management
                0., 0., 0., 3., 4., // investments
                350., 200., // recent rents
                4., // farms
                22., 12., // free plots
                340., 180., // new rents
            ]
        );
    }

    #[test]
    fn test_shape_mismatch() {
        let flatten = RlDataFlattener::default();

        let mut data = sample();
        data.recent_rents.push(1.0);
        assert!(matches!(
            flatten.features(&data),
            Err(CoordError::MalformedMessage(_))
        ));

        let mut data = sample();
        data.rest_invests.insert(5, Invest::default());
        assert!(matches!(
            flatten.features(&data),
            Err(CoordError::MalformedMessage(_))
        ));

        let mut data = sample();
        data.rest_plots_of_type[1].pop();
        assert!(matches!(
            flatten.features(&data),
            Err(CoordError::MalformedMessage(_))
        ));
    }
}
