use super::AtMostOne;
use crate::{Cnf, Lit, LiteralPool};

/// Bitwise (logarithmic) at-most-one.
///
/// Literal `i` being true forces `ceil(log2 n)` index bits to spell `i` in
/// binary, so two true literals would need two different codes at once.
#[derive(Clone, Copy, Debug, Default)]
pub struct Bitwise;

/// Number of bits needed to give each of `n` literals its own code.
pub(crate) fn code_width(n: usize) -> usize {
    if n < 2 {
        0
    } else {
        (usize::BITS - (n - 1).leading_zeros()) as usize
    }
}

impl AtMostOne for Bitwise {
    fn encode_at_most_one(&self, lits: &[Lit], name: &str, pool: &mut LiteralPool, cnf: &mut Cnf) {
        let width = code_width(lits.len());
        if width == 0 {
            return;
        }
        let bits = pool.new_literals(&format!("{}/bit", name), width);
        for (i, &x) in lits.iter().enumerate() {
            for (j, &b) in bits.iter().enumerate() {
                let bit = if (i >> j) & 1 == 1 { b } else { !b };
                cnf.add_implication(x, bit);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths() {
        assert_eq!(code_width(0), 0);
        assert_eq!(code_width(1), 0);
        assert_eq!(code_width(2), 1);
        assert_eq!(code_width(4), 2);
        assert_eq!(code_width(5), 3);
        assert_eq!(code_width(8), 3);
        assert_eq!(code_width(9), 4);
    }
}
