//! Loop surgery for dissolving the edge between two faces.

use crate::handles::VertexId;

/// Outcome of joining two face loops across a shared edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LoopUnion {
    /// The joined loop, in the first loop's winding.
    pub vertices: Vec<VertexId>,
    /// Vertex pairs that were folded out of the loop as spurs.
    pub spurs: Vec<(VertexId, VertexId)>,
}

/// Join `first` and `second` across the edge `a`–`b`.
///
/// `second` is reversed when it runs along the shared edge in the same
/// direction as `first` (opposite winding). Returns `None` if the edge is not
/// on both loops or if the joined boundary is not a simple loop.
pub(crate) fn union_loops(
    first: &[VertexId],
    second: &[VertexId],
    a: VertexId,
    b: VertexId,
) -> Option<LoopUnion> {
    let (a, b, i) = match directed_position(first, a, b) {
        Some(i) => (a, b, i),
        None => (b, a, directed_position(first, b, a)?),
    };

    let second: Vec<VertexId> = if directed_position(second, b, a).is_some() {
        second.to_vec()
    } else if directed_position(second, a, b).is_some() {
        second.iter().rev().copied().collect()
    } else {
        return None;
    };
    let j = directed_position(&second, b, a)?;

    // first rotated to run b .. a, second rotated to run a .. b.
    let n1 = first.len();
    let n2 = second.len();
    let mut vertices: Vec<VertexId> = (0..n1).map(|k| first[(i + 1 + k) % n1]).collect();
    vertices.extend((1..n2 - 1).map(|k| second[(j + 1 + k) % n2]));

    let spurs = collapse_spurs(&mut vertices);

    if vertices.len() < 3 || !all_distinct(&vertices) {
        return None;
    }
    Some(LoopUnion { vertices, spurs })
}

/// Index `i` such that `lp[i] == a` and `lp[i + 1] == b` (cyclically).
fn directed_position(lp: &[VertexId], a: VertexId, b: VertexId) -> Option<usize> {
    let n = lp.len();
    (0..n).find(|&i| lp[i] == a && lp[(i + 1) % n] == b)
}

/// Remove `x, y, x` back-tracks from a cyclic loop. Returns the folded pairs.
pub(crate) fn collapse_spurs(vertices: &mut Vec<VertexId>) -> Vec<(VertexId, VertexId)> {
    let mut spurs = Vec::new();
    loop {
        let n = vertices.len();
        if n < 3 {
            break;
        }
        let found = (0..n).find(|&k| vertices[(k + n - 1) % n] == vertices[(k + 1) % n]);
        let Some(k) = found else {
            break;
        };
        let tip = vertices[k];
        let base = vertices[(k + 1) % n];
        spurs.push((base, tip));
        // Drop the tip and the repeated base that follows it.
        let second = (k + 1) % n;
        if second > k {
            vertices.remove(second);
            vertices.remove(k);
        } else {
            vertices.remove(k);
            vertices.remove(second);
        }
    }
    spurs
}

fn all_distinct(vertices: &[VertexId]) -> bool {
    let mut seen = hashbrown::HashSet::with_capacity(vertices.len());
    vertices.iter().all(|v| seen.insert(*v))
}
