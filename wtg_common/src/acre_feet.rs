use std::{fmt::Display, iter::Sum, ops::Add};

use serde::{Deserialize, Serialize};
use sqlx::Type;

use crate::op;

//--------------------------------------     AcreFeet       ---------------------------------------------------------
/// A water volume in whole acre-feet. Trades are always denominated in whole units.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct AcreFeet(i64);

op!(binary AcreFeet, Add, add);
op!(binary AcreFeet, Sub, sub);
op!(inplace AcreFeet, SubAssign, sub_assign);

impl Sum for AcreFeet {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl From<i64> for AcreFeet {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for AcreFeet {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for AcreFeet {}

impl Display for AcreFeet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} AF", self.0)
    }
}

impl AcreFeet {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn formatting() {
        assert_eq!(AcreFeet::from(100).to_string(), "100 AF");
    }

    #[test]
    fn positivity() {
        assert!(AcreFeet::from(90).is_positive());
        assert!(!AcreFeet::from(0).is_positive());
        assert!(!AcreFeet::from(-1).is_positive());
    }
}
