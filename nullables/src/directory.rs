//! Nullable user and skill directory backed by in-memory lists.

use skillswap_types::{CounterpartyProfile, SkillDirectory, UserDirectory, UserId};

#[derive(Default)]
pub struct NullDirectory {
    users: Vec<(CounterpartyProfile, String)>,
    skills: Vec<String>,
}

impl NullDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, id: &str, name: &str, email: &str) -> Self {
        self.users.push((
            CounterpartyProfile {
                id: UserId::new(id),
                name: name.to_string(),
                avatar_url: None,
                email_verified: true,
                identity_verified: false,
            },
            email.to_string(),
        ));
        self
    }

    pub fn with_skills(mut self, skills: &[&str]) -> Self {
        self.skills.extend(skills.iter().map(|s| s.to_string()));
        self
    }
}

impl UserDirectory for NullDirectory {
    fn lookup(&self, id: &UserId) -> Option<CounterpartyProfile> {
        self.users
            .iter()
            .find(|(p, _)| &p.id == id)
            .map(|(p, _)| p.clone())
    }

    fn search(&self, query: &str) -> Vec<CounterpartyProfile> {
        let q = query.to_lowercase();
        self.users
            .iter()
            .filter(|(p, email)| {
                p.name.to_lowercase().contains(&q) || email.to_lowercase().contains(&q)
            })
            .map(|(p, _)| p.clone())
            .collect()
    }
}

impl SkillDirectory for NullDirectory {
    fn suggest(&self, prefix: &str, limit: usize) -> Vec<String> {
        let p = prefix.to_lowercase();
        self.skills
            .iter()
            .filter(|s| s.to_lowercase().starts_with(&p))
            .take(limit)
            .cloned()
            .collect()
    }
}
