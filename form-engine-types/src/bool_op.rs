/// A two-input boolean operator combining the standard verdict (`A`) with
/// the custom validator's verdict (`B`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BoolOp {
    False,
    True,
    A,
    B,
    NotA,
    NotB,
    #[default]
    And,
    Or,
    Xor,
    Nand,
    Nor,
    Xnor,
    /// A → B
    Implies,
    /// B → A
    ReverseImplies,
    NotAAndB,
    AAndNotB,
}

impl BoolOp {
    pub const ALL: [BoolOp; 16] = [
        Self::False,
        Self::True,
        Self::A,
        Self::B,
        Self::NotA,
        Self::NotB,
        Self::And,
        Self::Or,
        Self::Xor,
        Self::Nand,
        Self::Nor,
        Self::Xnor,
        Self::Implies,
        Self::ReverseImplies,
        Self::NotAAndB,
        Self::AAndNotB,
    ];

    /// Apply the operator.
    pub fn apply(self, a: bool, b: bool) -> bool {
        match self {
            Self::False => false,
            Self::True => true,
            Self::A => a,
            Self::B => b,
            Self::NotA => !a,
            Self::NotB => !b,
            Self::And => a && b,
            Self::Or => a || b,
            Self::Xor => a != b,
            Self::Nand => !(a && b),
            Self::Nor => !(a || b),
            Self::Xnor => a == b,
            Self::Implies => !a || b,
            Self::ReverseImplies => a || !b,
            Self::NotAAndB => !a && b,
            Self::AAndNotB => a && !b,
        }
    }

    /// The operator's truth table over `(a, b)` in the order
    /// `(false, false)`, `(false, true)`, `(true, false)`, `(true, true)`.
    pub fn truth_table(self) -> [bool; 4] {
        [
            self.apply(false, false),
            self.apply(false, true),
            self.apply(true, false),
            self.apply(true, true),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_operator_has_a_distinct_truth_table() {
        let tables: HashSet<[bool; 4]> = BoolOp::ALL.iter().map(|op| op.truth_table()).collect();
        assert_eq!(tables.len(), 16);
    }

    #[test]
    fn implications() {
        assert_eq!(BoolOp::Implies.truth_table(), [true, true, false, true]);
        assert_eq!(BoolOp::ReverseImplies.truth_table(), [true, false, true, true]);
    }
}
