/// A dynamic programming table. It is a serialized (position x state) 2-d array,
/// so the cells of one position are contiguous.
#[derive(Debug, Clone, PartialEq)]
pub struct DPTable {
    len: usize,
    states: usize,
    data: Vec<f64>,
}

impl DPTable {
    /// Create a new (len x states) table filled with `default`.
    pub fn new(len: usize, states: usize, default: f64) -> Self {
        Self {
            len,
            states,
            data: vec![default; len * states],
        }
    }
    /// The length of the sequence this table was filled for.
    pub fn len(&self) -> usize {
        self.len
    }
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
    pub fn states(&self) -> usize {
        self.states
    }
    fn get_index(&self, i: usize, s: usize) -> usize {
        assert!(i < self.len && s < self.states, "({},{})", i, s);
        i * self.states + s
    }
    pub fn get(&self, i: usize, s: usize) -> f64 {
        self.data[self.get_index(i, s)]
    }
    pub fn get_mut(&mut self, i: usize, s: usize) -> &mut f64 {
        let index = self.get_index(i, s);
        &mut self.data[index]
    }
    /// Return cells in the i-th position. The length of the returned slice is `states`.
    pub fn get_cells(&self, i: usize) -> &[f64] {
        let start = self.get_index(i, 0);
        &self.data[start..start + self.states]
    }
    pub fn get_cells_mut(&mut self, i: usize) -> &mut [f64] {
        let start = self.get_index(i, 0);
        &mut self.data[start..start + self.states]
    }
    /// Sum dp[i][s] over s.
    pub fn total(&self, i: usize) -> f64 {
        self.get_cells(i).iter().sum()
    }
    /// Iterate over positions, each item is the cells of a position.
    pub fn rows(&self) -> std::slice::ChunksExact<'_, f64> {
        self.data.chunks_exact(self.states)
    }
}

impl std::ops::Index<(usize, usize)> for DPTable {
    type Output = f64;
    fn index(&self, (i, s): (usize, usize)) -> &Self::Output {
        &self.data[self.get_index(i, s)]
    }
}

impl std::ops::IndexMut<(usize, usize)> for DPTable {
    fn index_mut(&mut self, (i, s): (usize, usize)) -> &mut Self::Output {
        let index = self.get_index(i, s);
        &mut self.data[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn index_layout() {
        let mut dp = DPTable::new(3, 2, 0f64);
        dp[(1, 1)] = 0.5;
        *dp.get_mut(2, 0) = 0.25;
        assert_eq!(dp.get_cells(1), &[0f64, 0.5]);
        assert_eq!(dp.get(2, 0), 0.25);
        assert!((dp.total(1) - 0.5).abs() < 0.000001);
        assert_eq!(dp.rows().count(), 3);
        assert_eq!((dp.len(), dp.states()), (3, 2));
    }
    #[test]
    #[should_panic]
    fn out_of_range() {
        let dp = DPTable::new(3, 2, 0f64);
        dp.get(3, 0);
    }
}
