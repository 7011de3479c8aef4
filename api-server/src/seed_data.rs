//! Demo dataset used by the `seed_demo` binary.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::models::ReactionType;

pub const DEPARTMENTS: [&str; 6] = [
    "Engineering",
    "Human Resources",
    "Marketing",
    "Design",
    "Finance",
    "Operations",
];

pub const EMPLOYEES_PER_DEPARTMENT: usize = 5;
pub const DEMO_PASSWORD: &str = "abc123";

pub const ADMIN_EMAIL: &str = "admin@bragboard.com";
pub const ADMIN_NAME: &str = "System Admin";
pub const ADMIN_DEPARTMENT: &str = "Human Resources";
pub const ADMIN_DESIGNATION: &str = "Administrator";

pub const SHOUTOUT_COUNT: usize = 15;
pub const RECIPIENTS_PER_SHOUTOUT: usize = 2;
pub const SHOUTOUT_REPORTS: usize = 5;
pub const COMMENT_REPORTS: usize = 3;

pub const DESIGNATIONS: [&str; 4] = ["Engineer", "Manager", "Intern", "Lead"];

const FIRST_NAMES: [&str; 12] = [
    "Ada", "Grace", "Linus", "Margaret", "Alan", "Barbara", "Dennis", "Frances", "Ken", "Radia",
    "Edsger", "Katherine",
];

const LAST_NAMES: [&str; 12] = [
    "Lovelace", "Hopper", "Torvalds", "Hamilton", "Turing", "Liskov", "Ritchie", "Allen",
    "Thompson", "Perlman", "Dijkstra", "Johnson",
];

const SHOUTOUT_MESSAGES: [&str; 8] = [
    "Thanks for jumping in on the release and keeping everyone calm under pressure.",
    "Huge help untangling the quarterly numbers before the board review.",
    "The onboarding guide you wrote saved the new hires days of confusion.",
    "Brilliant work on the launch campaign, the response has been amazing.",
    "Thank you for covering the support rotation over the long weekend.",
    "Your design review feedback made the new dashboard so much clearer.",
    "Really appreciate you mentoring the interns through their first sprint.",
    "The migration went off without a hitch thanks to your planning.",
];

const COMMENTS: [&str; 6] = [
    "Totally agree, well deserved!",
    "This made a huge difference for our team.",
    "Couldn't have said it better.",
    "Thank you from all of us!",
    "Amazing work as always.",
    "Adding my thanks to this one.",
];

const REPORT_REASONS: [&str; 4] = [
    "Contains inaccurate information",
    "Off-topic for the recognition board",
    "Possibly inappropriate wording",
    "Duplicate post",
];

/// Login email for the `index`-th demo employee of a department.
pub fn employee_email(department: &str, index: usize) -> String {
    let slug: String = department
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    format!("{slug}{index}@gmail.com")
}

pub fn avatar_url(email: &str) -> String {
    format!("https://i.pravatar.cc/150?u={email}")
}

pub fn random_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let first = FIRST_NAMES[rng.gen_range(0..FIRST_NAMES.len())];
    let last = LAST_NAMES[rng.gen_range(0..LAST_NAMES.len())];
    format!("{first} {last}")
}

pub fn random_designation<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    DESIGNATIONS[rng.gen_range(0..DESIGNATIONS.len())]
}

pub fn random_shoutout_message<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    SHOUTOUT_MESSAGES[rng.gen_range(0..SHOUTOUT_MESSAGES.len())]
}

pub fn random_comment<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    COMMENTS[rng.gen_range(0..COMMENTS.len())]
}

pub fn random_report_reason<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    REPORT_REASONS[rng.gen_range(0..REPORT_REASONS.len())]
}

pub fn random_reaction<R: Rng + ?Sized>(rng: &mut R) -> ReactionType {
    ReactionType::ALL[rng.gen_range(0..ReactionType::ALL.len())]
}

/// `count` distinct ids drawn from `ids` (fewer when `ids` is shorter).
pub fn sample_distinct<R: Rng + ?Sized>(rng: &mut R, ids: &[i32], count: usize) -> Vec<i32> {
    ids.choose_multiple(rng, count.min(ids.len())).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn employee_emails_strip_spaces_and_case() {
        assert_eq!(employee_email("Human Resources", 3), "humanresources3@gmail.com");
        assert_eq!(employee_email("Engineering", 0), "engineering0@gmail.com");
    }

    #[test]
    fn sampling_never_repeats_ids() {
        let mut rng = StdRng::seed_from_u64(7);
        let ids = [1, 2, 3, 4, 5];
        for _ in 0..20 {
            let picked = sample_distinct(&mut rng, &ids, 3);
            assert_eq!(picked.len(), 3);
            assert_eq!(picked.iter().collect::<HashSet<_>>().len(), 3);
        }
        assert_eq!(sample_distinct(&mut rng, &ids[..1], 2), vec![1]);
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        assert_eq!(random_name(&mut a), random_name(&mut b));
        assert_eq!(random_shoutout_message(&mut a), random_shoutout_message(&mut b));
    }
}
