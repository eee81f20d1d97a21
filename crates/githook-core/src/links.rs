use crate::push::Repository;

/// Browser URLs for a repository on the source-control host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryLinks {
    homepage: String,
}

impl RepositoryLinks {
    pub fn new(source_host: &str, repository: &Repository) -> Self {
        let homepage = format!(
            "{}/projects/{}/repos/{}",
            source_host.trim_end_matches('/'),
            repository.project.key,
            repository.slug
        );
        Self { homepage }
    }

    pub fn homepage(&self) -> &str {
        &self.homepage
    }

    pub fn commit_url(&self, commit_id: &str) -> String {
        format!("{}/commits/{commit_id}", self.homepage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push::Project;

    fn repository() -> Repository {
        Repository {
            name: "Backend".into(),
            slug: "backend".into(),
            project: Project { key: "OPS".into() },
        }
    }

    #[test]
    fn builds_homepage_and_commit_url() {
        let links = RepositoryLinks::new("https://stash.example.com", &repository());
        assert_eq!(
            links.homepage(),
            "https://stash.example.com/projects/OPS/repos/backend"
        );
        assert_eq!(
            links.commit_url("abcd"),
            "https://stash.example.com/projects/OPS/repos/backend/commits/abcd"
        );
    }

    #[test]
    fn trailing_slash_on_host_is_ignored() {
        let with = RepositoryLinks::new("https://stash.example.com/", &repository());
        let without = RepositoryLinks::new("https://stash.example.com", &repository());
        assert_eq!(with, without);
    }
}
