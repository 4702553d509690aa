/// 体素网格数据结构
/// 表示三维规则网格上每个体素的一个值（标量或向量）
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelGrid<T> {
    /// 网格维度 [nz, ny, nx]
    pub shape: [usize; 3],
    /// 数据数组，按 C 语言顺序存储 (x变化最快，y其次，z最慢)
    /// 索引计算: index = k * ny * nx + j * nx + i
    pub data: Vec<T>,
}

impl<T> VoxelGrid<T> {
    /// 将展平数组重塑为体素网格，元素数量必须与 shape 一致
    pub fn new(shape: [usize; 3], data: Vec<T>) -> Result<Self, String> {
        let total_elements = shape[0]
            .checked_mul(shape[1])
            .and_then(|n| n.checked_mul(shape[2]))
            .ok_or_else(|| format!("shape {:?} 的元素数量溢出", shape))?;

        if data.len() != total_elements {
            return Err(format!(
                "数据量不匹配: shape {:?} 需要 {} 个元素，但提供了 {} 个",
                shape,
                total_elements,
                data.len()
            ));
        }

        Ok(VoxelGrid { shape, data })
    }

    /// 逐体素变换，保持 shape 与顺序不变
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> VoxelGrid<U> {
        VoxelGrid {
            shape: self.shape,
            data: self.data.iter().map(f).collect(),
        }
    }

    /// 两个同形网格逐体素组合
    pub fn zip_map<U, V>(
        &self,
        other: &VoxelGrid<U>,
        mut f: impl FnMut(&T, &U) -> V,
    ) -> Result<VoxelGrid<V>, String> {
        if self.shape != other.shape {
            return Err(format!(
                "网格形状不一致: {:?} 与 {:?}",
                self.shape, other.shape
            ));
        }
        Ok(VoxelGrid {
            shape: self.shape,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(a, b)| f(a, b))
                .collect(),
        })
    }

    /// 按 (k, j, i) 取值
    #[cfg(test)]
    fn get(&self, k: usize, j: usize, i: usize) -> Option<&T> {
        let [nz, ny, nx] = self.shape;
        if k >= nz || j >= ny || i >= nx {
            return None;
        }
        self.data.get(k * ny * nx + j * nx + i)
    }

    /// 展平回节点顺序
    pub fn into_data(self) -> Vec<T> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reshape_rejects_wrong_length() {
        let err = VoxelGrid::new([2, 2, 2], vec![0.0_f64; 7]).unwrap_err();
        assert!(err.contains('8'));
        assert!(err.contains('7'));
    }

    #[test]
    fn test_overflowing_shape_is_rejected() {
        let err = VoxelGrid::new([usize::MAX, 2, 1], vec![0.0_f64; 2]).unwrap_err();
        assert!(err.contains("溢出"));
    }

    #[test]
    fn test_x_varies_fastest() {
        let grid = VoxelGrid::new([2, 1, 3], (0..6).collect::<Vec<i32>>()).unwrap();
        assert_eq!(grid.get(0, 0, 2), Some(&2));
        assert_eq!(grid.get(1, 0, 0), Some(&3));
        assert_eq!(grid.get(2, 0, 0), None);
    }

    #[test]
    fn test_zip_map_keeps_order() {
        let a = VoxelGrid::new([1, 1, 3], vec![1.0, 2.0, 3.0]).unwrap();
        let b = a.map(|v| v * 10.0);
        let sum = a.zip_map(&b, |x, y| x + y).unwrap();
        assert_eq!(sum.into_data(), vec![11.0, 22.0, 33.0]);
    }

    #[test]
    fn test_zip_map_shape_mismatch() {
        let a = VoxelGrid::new([1, 1, 2], vec![1.0, 2.0]).unwrap();
        let b = VoxelGrid::new([1, 2, 1], vec![1.0, 2.0]).unwrap();
        assert!(a.zip_map(&b, |x, y| x + y).is_err());
    }
}
