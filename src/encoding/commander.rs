use super::{pairwise, AtMostOne};
use crate::{Cnf, Lit, LiteralPool};

/// Literals per group below one commander.
const GROUP_SIZE: usize = 3;

/// Commander at-most-one in the style of Heule.
///
/// The literals are cut into groups of three. Each group gets a flag `y`
/// that must be false as soon as a literal of the group is true (pairwise
/// over the group and `y`, so at most four literals per block). The negated
/// flags then act as the group commanders and the same scheme is applied to
/// them, level by level, until four or fewer literals remain.
#[derive(Clone, Copy, Debug, Default)]
pub struct Commander;

impl AtMostOne for Commander {
    fn encode_at_most_one(&self, lits: &[Lit], name: &str, pool: &mut LiteralPool, cnf: &mut Cnf) {
        let mut level = lits.to_vec();
        let mut depth = 0;
        while level.len() > GROUP_SIZE + 1 {
            let mut commanders = Vec::with_capacity(level.len() / GROUP_SIZE + 1);
            for (g, group) in level.chunks(GROUP_SIZE).enumerate() {
                if group.len() == 1 {
                    commanders.push(group[0]);
                    continue;
                }
                let y = pool.new_literal(&format!("{}/cmd{}.{}", name, depth, g));
                let mut block = group.to_vec();
                block.push(y);
                pairwise::encode(&block, cnf);
                commanders.push(!y);
            }
            level = commanders;
            depth += 1;
        }
        pairwise::encode(&level, cnf);
    }
}
