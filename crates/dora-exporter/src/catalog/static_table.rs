use std::collections::HashMap;

use async_trait::async_trait;

use dora_core::model::Team;

use super::{TeamCatalog, UNKNOWN_TEAM};

/// Catalog backed by the `teams` section of the config.
///
/// When several teams list the same repository or project, the first one wins.
#[derive(Debug, Default)]
pub struct StaticCatalog {
    by_repository: HashMap<String, String>,
    by_project: HashMap<String, String>,
}

impl StaticCatalog {
    pub fn new(teams: &[Team]) -> Self {
        let mut by_repository = HashMap::new();
        let mut by_project = HashMap::new();
        for team in teams {
            for repo in &team.repositories {
                by_repository
                    .entry(repo.clone())
                    .or_insert_with(|| team.name.clone());
            }
            for project in &team.projects {
                by_project
                    .entry(project.clone())
                    .or_insert_with(|| team.name.clone());
            }
        }
        tracing::info!(teams = teams.len(), "static catalog loaded");
        Self {
            by_repository,
            by_project,
        }
    }

    pub fn team_for_repository(&self, repo_full_name: &str) -> &str {
        self.by_repository
            .get(repo_full_name)
            .map_or(UNKNOWN_TEAM, String::as_str)
    }

    pub fn team_for_project(&self, project_key: &str) -> &str {
        self.by_project
            .get(project_key)
            .map_or(UNKNOWN_TEAM, String::as_str)
    }
}

#[async_trait]
impl TeamCatalog for StaticCatalog {
    fn mode(&self) -> &'static str {
        "static"
    }

    async fn resolve_by_repository(&self, repo_full_name: &str) -> String {
        self.team_for_repository(repo_full_name).to_string()
    }

    async fn resolve_by_project(&self, project_key: &str) -> String {
        self.team_for_project(project_key).to_string()
    }
}
