//! Database seed script: initial super admin and default categories
//! Run with: cargo run --bin seed

use pagination::DataSource;
use rand::{distributions::Alphanumeric, Rng};

use live_admin_api::config::Config;
use live_admin_api::db::{CategoryFilter, Database};
use live_admin_api::middleware::AdminRole;
use live_admin_api::models::{slugify, CreateCategory, UpdateAdmin, ADMIN_STATUS_ACTIVE};
use live_admin_api::services::{hash_password, AdminService};

const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("Just Chatting", "Hang out and talk with the community"),
    ("Gaming", "Live gameplay of every genre"),
    ("Music", "Live performances, DJ sets and jam sessions"),
    ("Creative", "Art, crafting and making things on stream"),
    ("Esports", "Tournaments and competitive matches"),
    ("Sports & Fitness", "Workouts, coaching and live sports talk"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    println!("Connecting to database...");
    let db = Database::connect(&config).await?;
    db.run_migrations().await?;
    println!("Connected successfully!");

    // Default admin credentials
    let email = std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@live.local".to_string());
    let name = std::env::var("ADMIN_NAME").unwrap_or_else(|_| "Administrator".to_string());
    let password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| random_password(16));

    let admins = db.admins();
    match admins.find_by_email(&email).await? {
        Some(existing) => {
            println!("Resetting existing admin...");
            admins
                .update_password(existing.id, &hash_password(&password)?)
                .await?;
            admins
                .update(
                    existing.id,
                    UpdateAdmin {
                        name: None,
                        role: Some(AdminRole::SuperAdmin),
                        status: Some(ADMIN_STATUS_ACTIVE.to_string()),
                    },
                )
                .await?;
            admins.clear_lock(existing.id).await?;
        }
        None => {
            println!("Creating new admin...");
            AdminService::new(db.clone())
                .create(&email, &password, &name, AdminRole::SuperAdmin)
                .await?;
        }
    }

    let categories = db.categories();
    let existing = categories.listing().count(&CategoryFilter::default()).await?;
    if existing == 0 {
        for (order, (name, description)) in DEFAULT_CATEGORIES.iter().enumerate() {
            categories
                .create(CreateCategory {
                    name: name.to_string(),
                    slug: slugify(name),
                    description: Some(description.to_string()),
                    sort_order: order as i32 * 10,
                    is_active: true,
                })
                .await?;
        }
        println!("Inserted {} default categories", DEFAULT_CATEGORIES.len());
    } else {
        println!("Categories already present ({}), skipping", existing);
    }

    println!("\n========================================");
    println!("Admin Account Ready!");
    println!("========================================");
    println!("Email:    {}", email);
    println!("Password: {}", password);
    println!("Role:     super_admin");
    println!("========================================");

    Ok(())
}

fn random_password(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
