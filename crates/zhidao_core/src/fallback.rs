//! crates/zhidao_core/src/fallback.rs
//!
//! Deterministic placeholder data, keyed by topic, used when the learning
//! service cannot be reached. Same input, same output: no clocks, no randomness.

use crate::domain::{
    Content, ContentKind, CrossDisciplinaryRecommendation, DeepQuestion, Exploration,
    LearningPath,
};

/// Exploration percentage reported alongside the placeholder recommendations.
pub const FALLBACK_EXPLORATION_PERCENTAGE: u8 = 40;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Three default items with descending relevance.
pub fn default_content(topic: &str) -> Vec<Content> {
    vec![
        Content {
            id: "default-1".to_string(),
            title: format!("基础概念 - {topic}"),
            summary: format!("这是关于{topic}的基础概念和入门知识"),
            authors: strings(&["专家 张"]),
            year: Some(2024),
            kind: ContentKind::Academic,
            tags: strings(&["基础", "入门"]),
            relevance_score: 0.95,
        },
        Content {
            id: "default-2".to_string(),
            title: format!("应用案例 - {topic}"),
            summary: format!("实际应用中的{topic}案例分析"),
            authors: strings(&["教授 李"]),
            year: Some(2023),
            kind: ContentKind::Synthetic,
            tags: strings(&["应用", "案例"]),
            relevance_score: 0.88,
        },
        Content {
            id: "default-3".to_string(),
            title: format!("最新进展 - {topic}"),
            summary: format!("{topic}领域的最新研究成果和趋势"),
            authors: strings(&["研究员 王"]),
            year: Some(2024),
            kind: ContentKind::News,
            tags: strings(&["研究", "趋势"]),
            relevance_score: 0.78,
        },
    ]
}

pub fn deep_questions(topic: &str) -> Vec<DeepQuestion> {
    vec![
        DeepQuestion {
            id: "fallback-question-1".to_string(),
            question: format!("什么是{topic}的核心原理？"),
            category: "原理".to_string(),
            difficulty: 3,
        },
        DeepQuestion {
            id: "fallback-question-2".to_string(),
            question: format!("{topic}如何应用于实际场景？"),
            category: "应用".to_string(),
            difficulty: 4,
        },
    ]
}

pub fn exploration(topic: &str) -> Exploration {
    Exploration {
        recommendations: vec![
            CrossDisciplinaryRecommendation {
                id: "fallback-recommendation-1".to_string(),
                area: "物理学".to_string(),
                connection: format!("{topic}与物理学有许多相似的概念"),
                value_proposition: format!("学习物理学可以帮助你更好地理解{topic}的基本原理"),
                exploration_difficulty: 3,
            },
            CrossDisciplinaryRecommendation {
                id: "fallback-recommendation-2".to_string(),
                area: "心理学".to_string(),
                connection: format!("心理学视角可以帮助理解{topic}的应用场景"),
                value_proposition: format!(
                    "心理学提供了理解人类行为的框架，可以应用到{topic}的学习中"
                ),
                exploration_difficulty: 2,
            },
        ],
        exploration_percentage: FALLBACK_EXPLORATION_PERCENTAGE,
    }
}

/// Four-section path; only the first foundational item mentions the topic.
pub fn learning_path(topic: &str) -> LearningPath {
    LearningPath {
        foundational: vec![
            format!("基础概念: {topic}"),
            "历史背景".to_string(),
            "核心原理".to_string(),
        ],
        intermediate: strings(&["应用场景", "关键技术", "常见问题"]),
        advanced: strings(&["前沿研究", "理论深化", "高级应用"]),
        projects: strings(&["初级项目", "实践案例", "创新应用"]),
    }
}

/// Fixed topic to related-topics table. Unknown goals have no related topics.
pub fn related_topics(goal: &str) -> Vec<String> {
    let related: &[&str] = match goal {
        "人工智能基础" => &["机器学习", "神经网络", "深度学习", "数据科学"],
        "中国古代哲学" => &["儒家思想", "道家思想", "墨家", "法家"],
        "量子计算入门" => &["量子力学", "量子比特", "量子算法", "量子纠缠"],
        "宏观经济学" => &["GDP", "通货膨胀", "经济周期", "财政政策"],
        _ => &[],
    };
    strings(related)
}
