//! 罗马数字转换
//!
//! 单元标号常见 I–X，但转换按标准减法规则实现，任意合法
//! 罗马数字都能转。

/// 把罗马数字解析为整数
///
/// 非法字符或空串返回 None。大小写不敏感。
pub fn parse_roman(s: &str) -> Option<u32> {
    if s.is_empty() {
        return None;
    }

    let mut total: u32 = 0;
    let mut prev: u32 = 0;

    for c in s.chars().rev() {
        let value = match c.to_ascii_uppercase() {
            'I' => 1,
            'V' => 5,
            'X' => 10,
            'L' => 50,
            'C' => 100,
            'D' => 500,
            'M' => 1000,
            _ => return None,
        };

        if value < prev {
            total = total.checked_sub(value)?;
        } else {
            total = total.checked_add(value)?;
            prev = value;
        }
    }

    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_numerals() {
        assert_eq!(parse_roman("I"), Some(1));
        assert_eq!(parse_roman("IV"), Some(4));
        assert_eq!(parse_roman("IX"), Some(9));
        assert_eq!(parse_roman("X"), Some(10));
    }

    #[test]
    fn test_beyond_ten() {
        // 标准减法规则对 X 以上同样成立
        assert_eq!(parse_roman("XIV"), Some(14));
        assert_eq!(parse_roman("XL"), Some(40));
        assert_eq!(parse_roman("MCMXCIV"), Some(1994));
    }

    #[test]
    fn test_lowercase_and_invalid() {
        assert_eq!(parse_roman("iii"), Some(3));
        assert_eq!(parse_roman(""), None);
        assert_eq!(parse_roman("ABC"), None);
    }
}
