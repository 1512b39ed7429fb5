use clap::Args;
use gyohwan::auth::JwtTokenService;
use gyohwan::config::{AuthConfig, ExchangePolicy};
use gyohwan::error::AppError;
use gyohwan::exchange::{
    ApplicationChoice, ExchangeService, MemoryExchangeStore, NewUser, University, UniversityId,
    UserId,
};
use gyohwan::seed::CatalogImporter;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct CatalogArgs {
    /// University catalog CSV (id,name,country,slot,duration)
    #[arg(long, default_value = "data/universities.csv")]
    pub(crate) catalog_csv: PathBuf,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Optional catalog CSV; a small built-in catalog is used otherwise.
    #[arg(long)]
    pub(crate) catalog_csv: Option<PathBuf>,
    /// Modifications granted to each demo student.
    #[arg(long, default_value_t = 2)]
    pub(crate) modify_quota: u32,
}

pub(crate) fn run_catalog_report(args: CatalogArgs) -> Result<(), AppError> {
    let universities = CatalogImporter::from_path(&args.catalog_csv)?;

    println!("Partner universities ({})", args.catalog_csv.display());
    for university in &universities {
        let duration = if university.duration.is_empty() {
            "-"
        } else {
            university.duration.as_str()
        };
        println!(
            "- [{}] {} ({}) | {} slot(s) | {}",
            university.id, university.name, university.country, university.slot, duration
        );
    }

    let slots: u32 = universities.iter().map(|university| university.slot).sum();
    println!(
        "\n{} universities offering {} slots in total",
        universities.len(),
        slots
    );
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let universities = match &args.catalog_csv {
        Some(path) => CatalogImporter::from_path(path)?,
        None => sample_catalog(),
    };
    let first = universities.first().map(|u| u.id);
    let second = universities.get(1).map(|u| u.id);
    let (Some(first), Some(second)) = (first, second) else {
        println!("The demo needs at least two universities in the catalog.");
        return Ok(());
    };

    let policy = ExchangePolicy {
        modify_quota: args.modify_quota,
        detail_requires_application: false,
    };
    let store = Arc::new(MemoryExchangeStore::new(universities));
    let tokens = Arc::new(JwtTokenService::new(&AuthConfig {
        token_secret: "demo-only-secret".to_string(),
        token_ttl_minutes: 15,
    })?);
    let service = ExchangeService::new(store, tokens, policy);

    println!("Exchange application demo");
    let mut students = Vec::new();
    for (nickname, grade) in [("mina", 4.21), ("jun", 3.87), ("sora", 4.21)] {
        match service.register(demo_student(nickname, grade)) {
            Ok(profile) => {
                println!(
                    "- Registered {} (id {}, grade {:.2}, {} modifications)",
                    nickname, profile.id, profile.grade, profile.modify_count
                );
                students.push(profile.id);
            }
            Err(err) => {
                println!("  Registration rejected: {}", err);
                return Ok(());
            }
        }
    }

    match service.login(&demo_uuid("mina")) {
        Ok(session) => println!(
            "- mina signed in; {} token issued ({} chars)",
            session.token_type,
            session.access_token.len()
        ),
        Err(err) => println!("  Sign-in failed: {}", err),
    }

    println!("\nApplication updates");
    let plans: [(UserId, Vec<ApplicationChoice>); 3] = [
        (students[0], vec![choice(first, 1), choice(second, 2)]),
        (students[1], vec![choice(first, 1)]),
        (students[2], vec![choice(second, 1), choice(first, 2)]),
    ];
    for (user_id, choices) in plans {
        match service.update_applications(user_id, choices) {
            Ok(profile) => println!(
                "- user {} now holds {} application(s), {} modification(s) left",
                user_id,
                profile.applications.len(),
                profile.modify_count
            ),
            Err(err) => println!("- user {} rejected: {}", user_id, err),
        }
    }

    let gap = vec![choice(first, 1), choice(second, 3)];
    if let Err(err) = service.update_applications(students[1], gap) {
        println!("- gapped ranks rejected without spending budget: {}", err);
    }

    println!("\nBudget exhaustion");
    loop {
        match service.update_applications(students[0], vec![choice(second, 1)]) {
            Ok(profile) => println!(
                "- mina switched to a single choice, {} left",
                profile.modify_count
            ),
            Err(err) => {
                println!("- mina stopped: {}", err);
                break;
            }
        }
    }

    if let Err(err) = service.authenticate(None) {
        println!("\nRequests without a bearer token are refused: {}", err);
    }

    println!("\nRankings");
    print_rankings(&service, &[first, second]);
    Ok(())
}

fn print_rankings(
    service: &ExchangeService<MemoryExchangeStore, JwtTokenService>,
    universities: &[UniversityId],
) {
    for university_id in universities {
        match service.ranking().applicants_for(*university_id) {
            Ok(ranked) => {
                println!("- university {}: {} applicant(s)", university_id, ranked.len());
                for entry in ranked {
                    println!(
                        "    #{} {} (grade {:.2}, choice {})",
                        entry.rank,
                        entry.nickname.as_deref().unwrap_or("anonymous"),
                        entry.grade,
                        entry.choice
                    );
                }
            }
            Err(err) => println!("- university {} unavailable: {}", university_id, err),
        }
    }

    match service.universities() {
        Ok(listing) => match serde_json::to_string_pretty(&listing) {
            Ok(json) => println!("\nCatalog payload:\n{}", json),
            Err(err) => println!("\nCatalog payload unavailable: {}", err),
        },
        Err(err) => println!("\nCatalog unavailable: {}", err),
    }
}

fn choice(university_id: UniversityId, rank: u32) -> ApplicationChoice {
    ApplicationChoice {
        university_id,
        choice: rank,
    }
}

fn demo_uuid(nickname: &str) -> String {
    format!("demo-{nickname}")
}

fn demo_student(nickname: &str, grade: f64) -> NewUser {
    NewUser {
        email: format!("{nickname}@knu.ac.kr"),
        uuid: demo_uuid(nickname),
        nickname: Some(nickname.to_string()),
        grade,
        lang: "TOEIC 905".to_string(),
    }
}

fn sample_catalog() -> Vec<University> {
    [
        (1, "University of Tsukuba", "Japan", 2),
        (2, "Uppsala University", "Sweden", 1),
        (3, "University of Leeds", "United Kingdom", 3),
    ]
    .into_iter()
    .map(|(id, name, country, slot)| University {
        id: UniversityId(id),
        name: name.to_string(),
        country: country.to_string(),
        slot,
        duration: "1 semester".to_string(),
    })
    .collect()
}
