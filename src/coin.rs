use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// An amount of ScroogeCoin expressed in its smallest indivisible unit.
///
/// The amount is signed so that malformed outputs carrying a negative value can be represented
/// and rejected during validation. All arithmetic is checked; overflow is reported as `None`
/// instead of wrapping.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Coin(i64);

impl Coin {
    pub const fn new(amount: i64) -> Self {
        Coin(amount)
    }

    pub const fn zero() -> Self {
        Self::new(0)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    /// Sums the amounts, returning `None` if the total doesn't fit.
    pub fn checked_sum<I: IntoIterator<Item = Coin>>(amounts: I) -> Option<Self> {
        amounts
            .into_iter()
            .try_fold(Self::zero(), |sum, amount| sum.checked_add(amount))
    }
}

impl Display for Coin {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} SCR", self.0)
    }
}
