use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Every task the builder knows about.
///
/// The first six are the asset classes (transform tasks). `Building` and
/// `Clean` make up the distribution build, and `Watching` is the long-lived
/// dev server + file watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskId {
    Styles,
    Images,
    Fonts,
    Pages,
    Sprite,
    Scripts,
    Building,
    Clean,
    Watching,
}

impl TaskId {
    /// The six transform tasks, in the order the default target lists them.
    pub const ASSET_CLASSES: [TaskId; 6] = [
        TaskId::Styles,
        TaskId::Fonts,
        TaskId::Images,
        TaskId::Scripts,
        TaskId::Pages,
        TaskId::Sprite,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskId::Styles => "styles",
            TaskId::Images => "images",
            TaskId::Fonts => "fonts",
            TaskId::Pages => "pages",
            TaskId::Sprite => "sprite",
            TaskId::Scripts => "scripts",
            TaskId::Building => "building",
            TaskId::Clean => "clean",
            TaskId::Watching => "watching",
        }
    }

    /// Whether this task is one of the six asset transforms.
    pub fn is_asset_class(self) -> bool {
        Self::ASSET_CLASSES.contains(&self)
    }

    /// Long-lived tasks report progress instead of completing.
    pub fn is_long_lived(self) -> bool {
        matches!(self, TaskId::Watching)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "styles" => Ok(TaskId::Styles),
            "images" => Ok(TaskId::Images),
            "fonts" => Ok(TaskId::Fonts),
            "pages" => Ok(TaskId::Pages),
            "sprite" => Ok(TaskId::Sprite),
            "scripts" => Ok(TaskId::Scripts),
            "building" => Ok(TaskId::Building),
            "clean" => Ok(TaskId::Clean),
            "watching" => Ok(TaskId::Watching),
            other => Err(format!("unknown task: {other}")),
        }
    }
}

/// What the command line asked to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// A single task, run on its own.
    Task(TaskId),
    /// `clean` followed by `building`.
    Build,
    /// Every asset class in parallel, then `watching`.
    Default,
}

impl Target {
    /// Names accepted on the command line, in help order.
    pub const NAMES: [&'static str; 10] = [
        "styles", "images", "fonts", "pages", "building", "sprite", "scripts", "watching",
        "build", "default",
    ];
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Task(id) => write!(f, "{id}"),
            Target::Build => f.write_str("build"),
            Target::Default => f.write_str("default"),
        }
    }
}

impl FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "build" => Ok(Target::Build),
            "default" => Ok(Target::Default),
            // `clean` is an internal step of `build`, not a public target.
            "clean" => Err("unknown task: clean (use `build`)".to_string()),
            other => other.parse::<TaskId>().map(Target::Task),
        }
    }
}

/// How a DAG edge gates its dependent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// The dependent runs only if the dependency succeeded; otherwise it is
    /// failed without running.
    OnSuccess,
    /// The dependent runs once the dependency finished, whatever the outcome.
    OnSettled,
}

/// Notification pushed to connected dev-server clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ReloadEvent {
    /// Full page reload.
    Reload,
    /// Hot-swap the given stylesheets (paths relative to the served root).
    Inject { paths: Vec<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_ids_round_trip_through_names() {
        for id in TaskId::ASSET_CLASSES {
            assert_eq!(id.as_str().parse::<TaskId>().unwrap(), id);
        }
        assert_eq!("Watching".parse::<TaskId>().unwrap(), TaskId::Watching);
    }

    #[test]
    fn targets_parse_composites_and_reject_clean() {
        assert_eq!("build".parse::<Target>().unwrap(), Target::Build);
        assert_eq!("default".parse::<Target>().unwrap(), Target::Default);
        assert_eq!(
            "sprite".parse::<Target>().unwrap(),
            Target::Task(TaskId::Sprite)
        );
        assert!("clean".parse::<Target>().is_err());
        assert!("nope".parse::<Target>().is_err());
    }

    #[test]
    fn reload_events_serialize_as_tagged_json() {
        let reload = serde_json::to_string(&ReloadEvent::Reload).unwrap();
        assert_eq!(reload, r#"{"type":"reload"}"#);

        let inject = serde_json::to_string(&ReloadEvent::Inject {
            paths: vec!["css/style.min.css".to_string()],
        })
        .unwrap();
        assert_eq!(
            inject,
            r#"{"type":"inject","data":{"paths":["css/style.min.css"]}}"#
        );
    }
}
