use std::collections::HashSet;

use crate::dialect::Dialect;

/// Issues table aliases `A, B, ..., Z, AA, AB, ...` in strict order.
///
/// Reserved words of the dialect and any forbidden name (real table names)
/// are skipped, so an alias can never be mistaken for a keyword or a table.
#[derive(Debug)]
pub struct AliasGenerator<'d> {
    dialect: &'d dyn Dialect,
    counter: u64,
    forbidden: HashSet<String>,
}

impl<'d> AliasGenerator<'d> {
    pub fn new(dialect: &'d dyn Dialect) -> Self {
        Self {
            dialect,
            counter: 0,
            forbidden: HashSet::new(),
        }
    }

    /// Never hand out `name` (compared case-insensitively)
    pub fn forbid(&mut self, name: &str) {
        self.forbidden.insert(name.to_ascii_uppercase());
    }

    pub fn is_forbidden(&self, name: &str) -> bool {
        self.forbidden.contains(&name.to_ascii_uppercase())
    }

    pub fn next_alias(&mut self) -> String {
        loop {
            self.counter += 1;
            let candidate = encode(self.counter);
            if self.dialect.is_reserved(&candidate) || self.forbidden.contains(&candidate) {
                continue;
            }
            return candidate;
        }
    }

    /// Number of candidates generated so far, skipped ones included
    pub fn issued(&self) -> u64 {
        self.counter
    }
}

/// Bijective base-26: 1 -> A, 26 -> Z, 27 -> AA
fn encode(mut n: u64) -> String {
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push(b'A' + (n % 26) as u8);
        n /= 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}
