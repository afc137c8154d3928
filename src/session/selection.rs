use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::engine::timer::TimerMode;
use crate::session::error::ConfigurationError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Topic {
    Arrays,
    LinkedList,
    BinarySearch,
    Graphs,
    Trees,
    DynamicProgramming,
    HashTables,
    StackAndQueue,
    ReactJs,
    NodeJs,
    Oops,
}

pub const ALL_TOPICS: &[Topic] = &[
    Topic::Arrays,
    Topic::LinkedList,
    Topic::BinarySearch,
    Topic::Graphs,
    Topic::Trees,
    Topic::DynamicProgramming,
    Topic::HashTables,
    Topic::StackAndQueue,
    Topic::ReactJs,
    Topic::NodeJs,
    Topic::Oops,
];

impl Topic {
    /// Stable key used in config files, the CLI, and bundled asset names.
    pub fn key(self) -> &'static str {
        match self {
            Topic::Arrays => "arrays",
            Topic::LinkedList => "linked-list",
            Topic::BinarySearch => "binary-search",
            Topic::Graphs => "graphs",
            Topic::Trees => "trees",
            Topic::DynamicProgramming => "dynamic-programming",
            Topic::HashTables => "hash-tables",
            Topic::StackAndQueue => "stack-and-queue",
            Topic::ReactJs => "react-js",
            Topic::NodeJs => "node-js",
            Topic::Oops => "oops",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Topic::Arrays => "Arrays",
            Topic::LinkedList => "Linked List",
            Topic::BinarySearch => "Binary Search",
            Topic::Graphs => "Graphs",
            Topic::Trees => "Trees",
            Topic::DynamicProgramming => "DP",
            Topic::HashTables => "Hash Tables",
            Topic::StackAndQueue => "Stack & Queue",
            Topic::ReactJs => "React js",
            Topic::NodeJs => "Node js",
            Topic::Oops => "OOPS",
        }
    }

    /// Phrase used when asking a text generator for a paragraph.
    pub fn prompt_phrase(self) -> &'static str {
        match self {
            Topic::Arrays => "arrays",
            Topic::LinkedList => "linked list",
            Topic::BinarySearch => "binary search",
            Topic::Graphs => "graphs",
            Topic::Trees => "trees",
            Topic::DynamicProgramming => "dynamic programming",
            Topic::HashTables => "hash tables",
            Topic::StackAndQueue => "stack and queue",
            Topic::ReactJs => "react-js",
            Topic::NodeJs => "node-js",
            Topic::Oops => "oops",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Topic {
    type Err = ConfigurationError;

    /// Accepts the stable key or the prompt phrase, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ALL_TOPICS
            .iter()
            .copied()
            .find(|t| t.key() == wanted || t.prompt_phrase() == wanted)
            .ok_or_else(|| ConfigurationError::UnknownTopic(s.to_string()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeBudget {
    #[serde(rename = "30s")]
    Seconds30,
    #[serde(rename = "60s")]
    Seconds60,
    #[serde(rename = "No Limit")]
    NoLimit,
}

pub const ALL_TIME_BUDGETS: &[TimeBudget] =
    &[TimeBudget::Seconds30, TimeBudget::Seconds60, TimeBudget::NoLimit];

impl TimeBudget {
    pub fn label(self) -> &'static str {
        match self {
            TimeBudget::Seconds30 => "30s",
            TimeBudget::Seconds60 => "60s",
            TimeBudget::NoLimit => "No Limit",
        }
    }

    pub fn timer_mode(self) -> TimerMode {
        match self {
            TimeBudget::Seconds30 => TimerMode::Countdown { duration_secs: 30 },
            TimeBudget::Seconds60 => TimerMode::Countdown { duration_secs: 60 },
            TimeBudget::NoLimit => TimerMode::CountUp,
        }
    }
}

impl fmt::Display for TimeBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TimeBudget {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "30s" | "30" => Ok(TimeBudget::Seconds30),
            "60s" | "60" => Ok(TimeBudget::Seconds60),
            "no limit" | "no-limit" | "nolimit" | "none" => Ok(TimeBudget::NoLimit),
            _ => Err(ConfigurationError::UnknownTimeBudget(s.to_string())),
        }
    }
}

/// What the user has picked so far. Both halves are needed before a start.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PracticeSelection {
    pub topic: Option<Topic>,
    pub time_budget: Option<TimeBudget>,
}

impl PracticeSelection {
    pub fn new(topic: Topic, time_budget: TimeBudget) -> Self {
        Self {
            topic: Some(topic),
            time_budget: Some(time_budget),
        }
    }

    pub fn validate(&self) -> Result<(Topic, TimeBudget), ConfigurationError> {
        match (self.topic, self.time_budget) {
            (Some(topic), Some(budget)) => Ok((topic, budget)),
            (None, Some(_)) => Err(ConfigurationError::MissingTopic),
            (Some(_), None) => Err(ConfigurationError::MissingTimeBudget),
            (None, None) => Err(ConfigurationError::MissingTopicAndTimeBudget),
        }
    }
}
