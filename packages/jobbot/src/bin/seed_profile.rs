// Seed or replace the candidate profile from a JSON file.
//
// The campaign refuses to run without a profile; this is how one gets in.

use anyhow::{Context, Result};
use serde::Deserialize;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct ProfileInput {
    full_name: Option<String>,
    summary: Option<String>,
    experience: Option<String>,
    education: Option<String>,
    projects: Option<String>,
    skills: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let profile_path =
        std::env::var("PROFILE_FILE").unwrap_or_else(|_| "profile.json".to_string());

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let raw = std::fs::read_to_string(&profile_path)
        .with_context(|| format!("Failed to read profile file {}", profile_path))?;
    let profile: ProfileInput =
        serde_json::from_str(&raw).context("Failed to parse profile file")?;

    // Single-profile store: replace whatever is there.
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM user_profile")
        .execute(&mut *tx)
        .await?;
    sqlx::query(
        r#"
        INSERT INTO user_profile (id, full_name, summary, experience, education, projects, skills)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(Uuid::now_v7())
    .bind(&profile.full_name)
    .bind(&profile.summary)
    .bind(&profile.experience)
    .bind(&profile.education)
    .bind(&profile.projects)
    .bind(&profile.skills)
    .execute(&mut *tx)
    .await
    .context("Failed to insert profile")?;
    tx.commit().await?;

    println!(
        "Profile seeded for {}",
        profile.full_name.as_deref().unwrap_or("(unnamed)")
    );

    Ok(())
}
