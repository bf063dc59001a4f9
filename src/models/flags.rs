// Members of the fact.flags set column.

/// Flag stored as a member of `fact.flags`. Members are set elements, not bits to add.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FactFlag {
    HasAcl,
    HasComments,
}

impl FactFlag {
    pub fn member(self) -> i64 {
        match self {
            FactFlag::HasAcl => 1,
            FactFlag::HasComments => 2,
        }
    }
}
