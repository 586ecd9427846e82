use std::ops::Range;

/// 切分时优先使用的断点，按优先级排列
const SEPARATORS: [&str; 8] = ["\n\n", "\n", "。", ". ", "! ", "? ", "；", " "];

/// 按字符数截断，不会切断多字节字符
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// 把文本切成有重叠的片段，长度按字符计
pub fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<&str> {
    split_text_ranges(text, chunk_size, overlap)
        .into_iter()
        .map(|range| &text[range])
        .collect()
}

/// 返回每个片段在原文中的字节范围
///
/// 片段首尾相接或互相重叠，第一个从0开始，最后一个在文本末尾结束。
/// 断点优先选段落，其次是换行、句末标点和空格，且至少保留半个片段的长度；
/// 找不到合适断点时在 `chunk_size` 处硬切。下一个片段从上一个断点往回 `overlap` 个字符处开始。
pub fn split_text_ranges(text: &str, chunk_size: usize, overlap: usize) -> Vec<Range<usize>> {
    let chunk_size = chunk_size.max(1);
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(idx, _)| idx)
        .chain(std::iter::once(text.len()))
        .collect();
    let total = bounds.len() - 1;

    if total == 0 {
        return Vec::new();
    }

    let mut ranges = Vec::new();
    let mut start = 0;
    loop {
        let hard_end = (start + chunk_size).min(total);
        if hard_end == total {
            ranges.push(bounds[start]..text.len());
            break;
        }

        let window = &text[bounds[start]..bounds[hard_end]];
        let end = find_break(window, chunk_size / 2)
            .map(|chars| start + chars)
            .unwrap_or(hard_end);
        ranges.push(bounds[start]..bounds[end]);

        start = end.saturating_sub(overlap).max(start + 1);
    }

    ranges
}

/// 在窗口内找最靠后的断点，返回断点后的字符数
fn find_break(window: &str, min_chars: usize) -> Option<usize> {
    SEPARATORS.iter().find_map(|sep| {
        let pos = window.rfind(sep)? + sep.len();
        let chars = window[..pos].chars().count();
        (chars >= min_chars.max(1)).then_some(chars)
    })
}
