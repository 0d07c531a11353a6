/// One column of a pairwise alignment; `None` marks a gap on that side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignedColumn {
    pub a: Option<usize>,
    pub b: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalAlignment {
    /// Number of identical aligned pairs.
    pub score: usize,
    pub columns: Vec<AlignedColumn>,
}

impl GlobalAlignment {
    /// Renders both sides as gapped strings, mostly useful for diagnostics.
    pub fn render(&self, a: &[u8], b: &[u8]) -> (String, String) {
        let side = |index: Option<usize>, seq: &[u8]| index.map_or('-', |i| seq[i] as char);
        self.columns
            .iter()
            .map(|c| (side(c.a, a), side(c.b, b)))
            .unzip()
    }
}

/// Global alignment maximizing the number of identical pairs.
///
/// Matches score one; mismatches and gaps cost nothing, so any pairing is allowed and
/// only identities count. Among optimal alignments the traceback prefers pairing over
/// a gap in `b`, and a gap in `b` over a gap in `a`.
pub fn align_identity(a: &[u8], b: &[u8]) -> GlobalAlignment {
    let (n, m) = (a.len(), b.len());
    let width = m + 1;
    let mut score = vec![0usize; (n + 1) * width];

    for i in 1..=n {
        for j in 1..=m {
            let diagonal = score[(i - 1) * width + j - 1] + usize::from(a[i - 1] == b[j - 1]);
            let up = score[(i - 1) * width + j];
            let left = score[i * width + j - 1];
            score[i * width + j] = diagonal.max(up).max(left);
        }
    }

    let mut columns = Vec::with_capacity(n + m);
    let (mut i, mut j) = (n, m);
    while i > 0 || j > 0 {
        let current = score[i * width + j];
        if i > 0
            && j > 0
            && current == score[(i - 1) * width + j - 1] + usize::from(a[i - 1] == b[j - 1])
        {
            i -= 1;
            j -= 1;
            columns.push(AlignedColumn {
                a: Some(i),
                b: Some(j),
            });
        } else if i > 0 && (j == 0 || current == score[(i - 1) * width + j]) {
            i -= 1;
            columns.push(AlignedColumn {
                a: Some(i),
                b: None,
            });
        } else {
            j -= 1;
            columns.push(AlignedColumn {
                a: None,
                b: Some(j),
            });
        }
    }
    columns.reverse();

    GlobalAlignment {
        score: score[n * width + m],
        columns,
    }
}
