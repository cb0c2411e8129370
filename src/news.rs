use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Items kept in the feed before the oldest is dropped.
pub const NEWS_CAPACITY: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: u64,
    pub day: u64,
    pub text: String,
    pub sentiment: Sentiment,
}

#[derive(Debug, Clone, Default)]
pub struct NewsFeed {
    items: VecDeque<NewsItem>,
    next_id: u64,
}

impl NewsFeed {
    pub fn push(&mut self, day: u64, text: impl Into<String>, sentiment: Sentiment) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        if self.items.len() == NEWS_CAPACITY {
            self.items.pop_front();
        }
        self.items.push_back(NewsItem {
            id,
            day,
            text: text.into(),
            sentiment,
        });
        id
    }

    pub fn items(&self) -> impl Iterator<Item = &NewsItem> {
        self.items.iter()
    }

    pub fn latest(&self) -> Option<&NewsItem> {
        self.items.back()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
