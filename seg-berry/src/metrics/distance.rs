//! 逐切片的 Hausdorff 距离.
//!
//! 3D 体积被视为一叠 2D 切片. 每层切片分别计算两个方向的有向 Hausdorff 距离并取较大者,
//! 整个体积的结果为所有切片中的最大值. 这是真实 3D Hausdorff 距离的逐切片近似.
//!
//! 切片中的 "点" 有两种定义, 见 [`PointSet`]:
//!
//! 1. `Rows`: 沿 nii 文件的第一个轴 (即 `W`) 切片, 切片 `(H, z)` 的每一行是 `z` 维空间中的一个点.
//!   与 scipy 的 `directed_hausdorff` 直接作用于切片数组时的结果一致.
//! 2. `Foreground`: 沿 `z` 切片, 每个前景像素是一个二维点, 距离以体素索引为单位.
//!   有向距离 `h(A, B) = max_{a ∈ A} min_{b ∈ B} |a - b|` 借助 B 的精确欧氏距离变换求得,
//!   因此每层切片的代价与像素数成线性关系.

use ndarray::{Array2, ArrayView2, ArrayView3, ArrayViewMut1, Axis};

/// 切片中点集的定义.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PointSet {
    /// 切片的每一行是一个点, 坐标为该行的全部像素值.
    #[default]
    Rows,

    /// 切片的每个前景像素是一个点, 坐标为像素索引.
    Foreground,
}

/// 单侧切片没有前景时的处理策略. 仅用于 [`PointSet::Foreground`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EmptySlicePolicy {
    /// 空集上的最小值视为 `+inf`, 因此该切片贡献 `+inf`.
    #[default]
    Infinite,

    /// 忽略仅有一侧为空的切片.
    Skip,
}

/// 一维平方距离变换的下包络缓冲区 (Felzenszwalb & Huttenlocher).
///
/// 缓冲区可以在多条扫描线之间复用.
struct Envelope {
    f: Vec<f64>,
    v: Vec<usize>,
    z: Vec<f64>,
}

impl Envelope {
    fn new(n: usize) -> Self {
        Self {
            f: vec![0.0; n],
            v: vec![0; n],
            z: vec![0.0; n + 1],
        }
    }

    /// 就地将 `line` 替换为其一维平方距离变换.
    fn transform(&mut self, mut line: ArrayViewMut1<f64>) {
        let n = line.len();
        if n == 0 {
            return;
        }
        for (dst, src) in self.f.iter_mut().zip(line.iter()) {
            *dst = *src;
        }
        let (f, v, z) = (&self.f, &mut self.v, &mut self.z);

        let mut k = 0usize;
        v[0] = 0;
        z[0] = f64::NEG_INFINITY;
        z[1] = f64::INFINITY;
        for q in 1..n {
            let fq = f[q] + (q * q) as f64;
            let mut s;
            loop {
                let p = v[k];
                s = (fq - (f[p] + (p * p) as f64)) / (2.0 * (q as f64 - p as f64));
                // z[0] 为 -inf, 因此 k 不会下溢.
                if s <= z[k] {
                    k -= 1;
                } else {
                    break;
                }
            }
            k += 1;
            v[k] = q;
            z[k] = s;
            z[k + 1] = f64::INFINITY;
        }

        k = 0;
        for (q, out) in line.iter_mut().enumerate() {
            while z[k + 1] < q as f64 {
                k += 1;
            }
            let d = q as f64 - v[k] as f64;
            *out = d * d + f[v[k]];
        }
    }
}

/// 计算 2D 切片的平方欧氏距离变换: 每个位置到最近非零像素的平方距离.
///
/// 切片必须至少存在一个非零像素, 否则结果无意义.
pub(crate) fn squared_edt(mask: ArrayView2<u8>) -> Array2<f64> {
    let (h, w) = mask.dim();
    // 大于切片内任意真实平方距离, 且保证所有中间量都是可精确表示的整数.
    let far = ((h + w) * (h + w) + 1) as f64;
    let mut grid = mask.mapv(|p| if p != 0 { 0.0 } else { far });
    let mut env = Envelope::new(h.max(w));
    for col in grid.axis_iter_mut(Axis(1)) {
        env.transform(col);
    }
    for row in grid.axis_iter_mut(Axis(0)) {
        env.transform(row);
    }
    grid
}

/// 有向 Hausdorff 距离的平方: `from` 的前景点到 `to_edt` 所描述点集的最远最近距离.
#[inline]
fn directed_sq(from: ArrayView2<u8>, to_edt: &Array2<f64>) -> f64 {
    from.iter()
        .zip(to_edt.iter())
        .filter(|(p, _)| **p != 0)
        .fold(0.0, |acc, (_, d)| f64::max(acc, *d))
}

/// 单层切片的对称 Hausdorff 距离.
///
/// 两侧均无前景时为 0; 仅一侧无前景时由 `policy` 决定, `Skip` 时返回 `None`.
///
/// 如果 `gt` 和 `pred` 形状不一致, 则程序 panic.
pub fn slice_hausdorff(
    gt: ArrayView2<u8>,
    pred: ArrayView2<u8>,
    policy: EmptySlicePolicy,
) -> Option<f64> {
    assert_eq!(gt.dim(), pred.dim(), "切片形状不一致");
    let gt_empty = gt.iter().all(|p| *p == 0);
    let pred_empty = pred.iter().all(|p| *p == 0);

    match (gt_empty, pred_empty) {
        (true, true) => Some(0.0),
        (true, false) | (false, true) => match policy {
            EmptySlicePolicy::Infinite => Some(f64::INFINITY),
            EmptySlicePolicy::Skip => None,
        },
        _ if gt == pred => Some(0.0),
        _ => {
            let forward = directed_sq(gt, &squared_edt(pred));
            let backward = directed_sq(pred, &squared_edt(gt));
            Some(f64::max(forward, backward).sqrt())
        }
    }
}

/// 按 [`PointSet::Rows`] 计算单层切片的对称 Hausdorff 距离: 每一行是一个点.
///
/// 重复的行不影响结果, 因此先去重再做两两比较.
///
/// 如果 `gt` 和 `pred` 形状不一致, 则程序 panic.
pub fn rows_hausdorff(gt: ArrayView2<u8>, pred: ArrayView2<u8>) -> f64 {
    assert_eq!(gt.dim(), pred.dim(), "切片形状不一致");
    if gt == pred {
        return 0.0;
    }
    let (a, b) = (unique_rows(gt), unique_rows(pred));
    let sq = u64::max(directed_rows_sq(&a, &b), directed_rows_sq(&b, &a));
    if sq == u64::MAX {
        f64::INFINITY
    } else {
        (sq as f64).sqrt()
    }
}

fn unique_rows(m: ArrayView2<u8>) -> Vec<Vec<u8>> {
    let mut rows: Vec<_> = m.rows().into_iter().map(|r| r.to_vec()).collect();
    rows.sort_unstable();
    rows.dedup();
    rows
}

#[inline]
fn sq_dist(a: &[u8], b: &[u8]) -> u64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = u64::from(x.abs_diff(*y));
            d * d
        })
        .sum()
}

/// 有向距离的平方. `to` 为空而 `from` 非空时为 `u64::MAX`.
fn directed_rows_sq(from: &[Vec<u8>], to: &[Vec<u8>]) -> u64 {
    let mut cmax = 0;
    for a in from {
        let mut cmin = u64::MAX;
        for b in to {
            cmin = cmin.min(sq_dist(a, b));
            // 该点已无法抬高当前最大值.
            if cmin <= cmax {
                break;
            }
        }
        cmax = cmax.max(cmin);
    }
    cmax
}

/// 按点集定义调整轴顺序, 使切片沿第一维排列.
///
/// `(z, H, W)` 数据在 `Rows` 下还原为文件中的 `(W, H, z)`.
#[inline]
fn sliced(v: ArrayView3<u8>, points: PointSet) -> ArrayView3<u8> {
    match points {
        PointSet::Rows => v.reversed_axes(),
        PointSet::Foreground => v,
    }
}

#[inline]
fn slice_distance(
    gt: ArrayView2<u8>,
    pred: ArrayView2<u8>,
    points: PointSet,
    policy: EmptySlicePolicy,
) -> Option<f64> {
    match points {
        PointSet::Rows => Some(rows_hausdorff(gt, pred)),
        PointSet::Foreground => slice_hausdorff(gt, pred, policy),
    }
}

/// 逐切片近似的 3D Hausdorff 距离: 所有切片对称距离的最大值.
///
/// `gt` 与 `pred` 按 `(z, H, W)` 组织. `policy` 只在 [`PointSet::Foreground`] 下生效.
///
/// 如果 `gt` 和 `pred` 形状不一致, 则程序 panic.
pub fn hausdorff_3d(
    gt: ArrayView3<u8>,
    pred: ArrayView3<u8>,
    points: PointSet,
    policy: EmptySlicePolicy,
) -> f64 {
    assert_eq!(gt.dim(), pred.dim(), "体积形状不一致");
    let (gt, pred) = (sliced(gt, points), sliced(pred, points));
    gt.axis_iter(Axis(0))
        .zip(pred.axis_iter(Axis(0)))
        .filter_map(|(g, p)| slice_distance(g, p, points, policy))
        .fold(0.0, f64::max)
}

/// 借助 `rayon`, 并行地计算逐切片近似的 3D Hausdorff 距离.
/// 结果与 [`hausdorff_3d`] 完全一致.
///
/// 如果 `gt` 和 `pred` 形状不一致, 则程序 panic.
#[cfg(feature = "rayon")]
pub fn par_hausdorff_3d(
    gt: ArrayView3<u8>,
    pred: ArrayView3<u8>,
    points: PointSet,
    policy: EmptySlicePolicy,
) -> f64 {
    use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};

    assert_eq!(gt.dim(), pred.dim(), "体积形状不一致");
    let (gt, pred) = (sliced(gt, points), sliced(pred, points));
    gt.axis_iter(Axis(0))
        .into_par_iter()
        .zip(pred.axis_iter(Axis(0)).into_par_iter())
        .filter_map(|(g, p)| slice_distance(g, p, points, policy))
        .reduce(|| 0.0, f64::max)
}
