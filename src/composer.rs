//! Text sources for outline items.
//!
//! The pipeline and the rephrase/replace handlers only talk to [`Composer`].
//! [`TemplateComposer`] fills fixed Russian templates; a generative backend
//! can implement the same trait without touching pacing or ordering.

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Draft, ItemKind};

#[async_trait]
pub trait Composer: Send + Sync {
    /// Goals and tasks for a topic, in emission order.
    async fn draft(&self, topic: &str) -> Result<Vec<Draft>>;

    /// Alternative wording for an existing item.
    async fn rephrase(&self, id: &str, kind: ItemKind) -> Result<String>;

    /// A different item to put in place of an existing one.
    async fn replace(&self, id: &str, kind: ItemKind) -> Result<String>;
}

/// Fixed-template composer. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateComposer;

impl TemplateComposer {
    pub fn goals(topic: &str) -> Vec<Draft> {
        vec![
            Draft::goal(format!(
                "Определить теоретические основания исследования темы «{topic}»."
            )),
            Draft::goal(format!(
                "Сформулировать методологию оценки и анализа по теме «{topic}»."
            )),
            Draft::goal(format!(
                "Обосновать практическую значимость исследования по теме «{topic}»."
            )),
        ]
    }

    pub fn tasks(topic: &str) -> Vec<Draft> {
        vec![
            Draft::task(format!(
                "Собрать и систематизировать источники по теме «{topic}»."
            )),
            Draft::task("Выявить ключевые подходы и определить критерии анализа."),
            Draft::task("Сформировать набор показателей для оценки результатов."),
            Draft::task("Проанализировать полученные данные и интерпретировать выводы."),
            Draft::task("Сформулировать рекомендации по итогам исследования."),
        ]
    }

    pub fn rephrase_text(id: &str, kind: ItemKind) -> String {
        format!("Переформулированный вариант ({kind}) для элемента {id}.")
    }

    pub fn replace_text(id: &str, kind: ItemKind) -> String {
        format!("Новая альтернатива ({kind}) для элемента {id}.")
    }
}

#[async_trait]
impl Composer for TemplateComposer {
    async fn draft(&self, topic: &str) -> Result<Vec<Draft>> {
        let mut drafts = Self::goals(topic);
        drafts.extend(Self::tasks(topic));
        Ok(drafts)
    }

    async fn rephrase(&self, id: &str, kind: ItemKind) -> Result<String> {
        Ok(Self::rephrase_text(id, kind))
    }

    async fn replace(&self, id: &str, kind: ItemKind) -> Result<String> {
        Ok(Self::replace_text(id, kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_draft_order_and_counts() {
        let drafts = TemplateComposer.draft("тема").await.unwrap();
        let kinds: Vec<ItemKind> = drafts.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ItemKind::Goal,
                ItemKind::Goal,
                ItemKind::Goal,
                ItemKind::Task,
                ItemKind::Task,
                ItemKind::Task,
                ItemKind::Task,
                ItemKind::Task,
            ]
        );
    }

    #[test]
    fn test_first_goal_exact_text() {
        let goals = TemplateComposer::goals("устойчивое развитие");
        assert_eq!(
            goals[0].text,
            "Определить теоретические основания исследования темы «устойчивое развитие»."
        );
    }

    #[test]
    fn test_only_first_task_mentions_topic() {
        let tasks = TemplateComposer::tasks("XYZ");
        assert!(tasks[0].text.contains("«XYZ»"));
        assert!(tasks[1..].iter().all(|t| !t.text.contains("XYZ")));
    }

    #[test]
    fn test_rephrase_and_replace_are_distinct() {
        let a = TemplateComposer::rephrase_text("g_12345678", ItemKind::Goal);
        let b = TemplateComposer::replace_text("g_12345678", ItemKind::Goal);
        assert_eq!(a, "Переформулированный вариант (goal) для элемента g_12345678.");
        assert_eq!(b, "Новая альтернатива (goal) для элемента g_12345678.");
        assert_ne!(a, b);
    }
}
