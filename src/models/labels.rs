//! 分值阈值表
//!
//! 难度与 CO/Bloom 标签都从题目分值推导，本模块是这两张表的
//! 唯一出处，解析/分配/组卷各处只允许引用这里。

use super::rules::Difficulty;

/// 按分值推导默认难度
///
/// 规则：≤2 分 → easy；3–5 分 → medium；≥6 分 → hard
pub fn difficulty_for_marks(marks: u32) -> Difficulty {
    match marks {
        0..=2 => Difficulty::Easy,
        3..=5 => Difficulty::Medium,
        _ => Difficulty::Hard,
    }
}

/// 按分值推导课程目标（CO）与 Bloom 认知层级（K）标签
pub fn co_bl_for_marks(marks: u32) -> (&'static str, &'static str) {
    match marks {
        0..=1 => ("CO1", "K1"),
        2 => ("CO1", "K2"),
        3 => ("CO2", "K2"),
        4..=5 => ("CO3", "K3"),
        6..=8 => ("CO4", "K3"),
        _ => ("CO5", "K4"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_thresholds() {
        assert_eq!(difficulty_for_marks(1), Difficulty::Easy);
        assert_eq!(difficulty_for_marks(2), Difficulty::Easy);
        assert_eq!(difficulty_for_marks(3), Difficulty::Medium);
        assert_eq!(difficulty_for_marks(5), Difficulty::Medium);
        assert_eq!(difficulty_for_marks(6), Difficulty::Hard);
        assert_eq!(difficulty_for_marks(16), Difficulty::Hard);
    }

    #[test]
    fn test_co_bl_table() {
        assert_eq!(co_bl_for_marks(1), ("CO1", "K1"));
        assert_eq!(co_bl_for_marks(2), ("CO1", "K2"));
        assert_eq!(co_bl_for_marks(3), ("CO2", "K2"));
        assert_eq!(co_bl_for_marks(5), ("CO3", "K3"));
        assert_eq!(co_bl_for_marks(8), ("CO4", "K3"));
        assert_eq!(co_bl_for_marks(10), ("CO5", "K4"));
    }
}
