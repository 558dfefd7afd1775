use nalgebra::Vector3;

/// 分子模型接口
/// 网格只需要原子坐标及其包围盒，用于按结构自动确定网格范围
pub trait AtomPositions {
    /// 所有原子的笛卡尔坐标
    fn atom_positions(&self) -> &[Vector3<f64>];

    /// 原子坐标的轴对齐包围盒 (min, max)，没有原子时返回 None
    fn extent(&self) -> Option<(Vector3<f64>, Vector3<f64>)> {
        let mut atoms = self.atom_positions().iter();
        let first = *atoms.next()?;
        Some(atoms.fold((first, first), |(lo, hi), p| (lo.inf(p), hi.sup(p))))
    }
}

/// 最简单的分子结构：只保存原子坐标
#[derive(Debug, Clone, Default)]
pub struct Molecule {
    positions: Vec<Vector3<f64>>,
}

impl Molecule {
    pub fn new(positions: Vec<Vector3<f64>>) -> Self {
        Self { positions }
    }

    pub fn add_atom(&mut self, position: Vector3<f64>) {
        self.positions.push(position);
    }

    pub fn atom_count(&self) -> usize {
        self.positions.len()
    }
}

impl From<&[[f64; 3]]> for Molecule {
    fn from(atoms: &[[f64; 3]]) -> Self {
        Self::new(atoms.iter().map(|a| Vector3::from(*a)).collect())
    }
}

impl AtomPositions for Molecule {
    fn atom_positions(&self) -> &[Vector3<f64>] {
        &self.positions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extent_of_empty_molecule_is_none() {
        assert!(Molecule::default().extent().is_none());
    }

    #[test]
    fn extent_covers_all_atoms() {
        let atoms = [[0.0, 1.0, -2.0], [3.0, -1.0, 0.5], [1.0, 0.0, 4.0]];
        let mol = Molecule::from(&atoms[..]);
        let (lo, hi) = mol.extent().unwrap();
        assert_eq!(lo, Vector3::new(0.0, -1.0, -2.0));
        assert_eq!(hi, Vector3::new(3.0, 1.0, 4.0));
        assert_eq!(mol.atom_count(), 3);
    }
}
