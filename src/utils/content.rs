// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 页面内容辅助函数
//!
//! 解码响应体、提取链接以及基于关键词计数的相关性评分

use chardetng::EncodingDetector;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("valid link selector"));

/// 相关性指示词，每出现一个加0.05分
const INDICATOR_TERMS: &[&str] = &[
    "design",
    "sizing",
    "calculation",
    "specification",
    "installation",
    "performance",
    "case study",
    "manual",
];

/// 将响应体解码为文本
///
/// 使用chardetng猜测编码，无法识别的字节被替换
pub fn decode_body(bytes: &[u8]) -> String {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return text.to_string();
    }
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding: &'static encoding_rs::Encoding = detector.guess(None, true);
    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

/// 从HTML内容中提取绝对http(s)链接
///
/// # 参数
///
/// * `html` - HTML内容
/// * `base_url` - 用于解析相对链接的基础URL
///
/// # 返回值
///
/// 去除片段标识符后的链接集合；基础URL无效时返回空集合
pub fn extract_links(html: &str, base_url: &str) -> HashSet<String> {
    let base = match Url::parse(base_url) {
        Ok(base) => base,
        Err(_) => return HashSet::new(),
    };
    let document = Html::parse_document(html);

    document
        .select(&LINK_SELECTOR)
        .filter_map(|element| element.value().attr("href"))
        .filter(|href| {
            !href.starts_with('#') && !href.starts_with("mailto:") && !href.starts_with("javascript:")
        })
        .filter_map(|href| base.join(href).ok())
        .filter(|url| url.scheme() == "http" || url.scheme() == "https")
        .map(|mut url| {
            url.set_fragment(None);
            url.to_string()
        })
        .collect()
}

/// 计算页面相对于关键词的相关性分数（0.0-1.0）
///
/// 每个关键词贡献 `min(出现次数 * 0.05, 0.3)`，每个出现的指示词额外加0.05
pub fn relevance_score(html: &str, keywords: &[String]) -> f64 {
    let document = Html::parse_document(html);
    let text = document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    let mut score = 0.0;
    for keyword in keywords {
        let keyword = keyword.to_lowercase();
        if keyword.is_empty() {
            continue;
        }
        let count = text.matches(keyword.as_str()).count() as f64;
        score += (count * 0.05).min(0.3);
    }

    score += INDICATOR_TERMS
        .iter()
        .filter(|term| text.contains(*term))
        .count() as f64
        * 0.05;

    score.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_links_resolves_relative_and_drops_fragments() {
        let html = r##"
            <a href="/docs/manual.pdf#page=2">Manual</a>
            <a href="https://other.org/x">Other</a>
            <a href="#top">Top</a>
            <a href="mailto:a@b.c">Mail</a>
            <a href="ftp://files.example.com/a">FTP</a>
        "##;

        let links = extract_links(html, "https://example.com/products/");

        assert_eq!(links.len(), 2);
        assert!(links.contains("https://example.com/docs/manual.pdf"));
        assert!(links.contains("https://other.org/x"));
    }

    #[test]
    fn test_extract_links_invalid_base() {
        assert!(extract_links("<a href='/a'>a</a>", "not a url").is_empty());
    }

    #[test]
    fn test_relevance_score_counts_keywords_and_indicators() {
        let html = "<html><body><p>Heat pump heat pump design manual</p></body></html>";
        let score = relevance_score(html, &["heat pump".to_string()]);

        // 2 * 0.05 + design + manual
        assert!((score - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_relevance_score_keyword_contribution_is_capped() {
        let html = format!("<p>{}</p>", "boiler ".repeat(50));
        let score = relevance_score(&html, &["boiler".to_string()]);

        assert!((score - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_decode_body_falls_back_for_non_utf8() {
        let bytes = [0x63, 0x61, 0x66, 0xe9];
        assert_eq!(decode_body(&bytes), "café");
    }
}
