//! Player role complexion.

use serde::{Deserialize, Serialize};

/// Role-fit scores for one player in one match, each 0-100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerComplexion {
    pub opener: f64,
    pub closer: f64,
    pub support: f64,
    pub fragger: f64,
}

/// One of the four complexion roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Opener,
    Closer,
    Support,
    Fragger,
}

impl PlayerComplexion {
    pub fn score(&self, role: Role) -> f64 {
        match role {
            Role::Opener => self.opener,
            Role::Closer => self.closer,
            Role::Support => self.support,
            Role::Fragger => self.fragger,
        }
    }

    /// Arithmetic mean of a set of complexions; all zero for an empty set.
    pub fn mean(items: &[PlayerComplexion]) -> PlayerComplexion {
        if items.is_empty() {
            return PlayerComplexion::default();
        }
        let n = items.len() as f64;
        let sum = items.iter().fold(PlayerComplexion::default(), |acc, c| {
            PlayerComplexion {
                opener: acc.opener + c.opener,
                closer: acc.closer + c.closer,
                support: acc.support + c.support,
                fragger: acc.fragger + c.fragger,
            }
        });
        PlayerComplexion {
            opener: sum.opener / n,
            closer: sum.closer / n,
            support: sum.support / n,
            fragger: sum.fragger / n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_of_empty_is_zero() {
        assert_eq!(PlayerComplexion::mean(&[]), PlayerComplexion::default());
    }

    #[test]
    fn test_mean() {
        let a = PlayerComplexion {
            opener: 80.0,
            closer: 20.0,
            support: 50.0,
            fragger: 60.0,
        };
        let b = PlayerComplexion {
            opener: 40.0,
            closer: 40.0,
            support: 10.0,
            fragger: 20.0,
        };
        let mean = PlayerComplexion::mean(&[a, b]);
        assert_eq!(mean.opener, 60.0);
        assert_eq!(mean.closer, 30.0);
        assert_eq!(mean.support, 30.0);
        assert_eq!(mean.fragger, 40.0);
    }

    #[test]
    fn test_score_by_role() {
        let c = PlayerComplexion {
            opener: 10.0,
            closer: 20.0,
            support: 70.0,
            fragger: 30.0,
        };
        assert_eq!(c.score(Role::Support), 70.0);
        assert_eq!(c.score(Role::Closer), 20.0);
    }
}
