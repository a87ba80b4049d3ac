use cms_backend::{
    auth::password::hash_password,
    config::ProcessEnv,
    db::{DbConfig, PgStore},
};
use std::{env, error::Error, process};

const MIN_PASSWORD_LEN: usize = 8;

fn usage() -> ! {
    eprintln!("Usage: seed-admin <USERNAME> <PASSWORD>");
    eprintln!("       seed-admin --hash-only <PASSWORD>");
    process::exit(1);
}

async fn hash(password: String) -> Result<String, Box<dyn Error>> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!("password must be at least {MIN_PASSWORD_LEN} characters").into());
    }
    Ok(tokio::task::spawn_blocking(move || hash_password(&password)).await??)
}

async fn seed(username: &str, password: String) -> Result<(), Box<dyn Error>> {
    let hashed = hash(password).await?;
    let config = DbConfig::from_env(&ProcessEnv)?;
    let store = PgStore::connect(&config).await?;
    let id = store.upsert_admin(username.trim(), &hashed).await?;

    println!("Admin '{}' ready (id {})", username.trim(), id);
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let args: Vec<String> = env::args().skip(1).collect();

    let result = match args.as_slice() {
        [flag, password] if flag == "--hash-only" => hash(password.clone()).await.map(|hashed| {
            println!("{hashed}");
        }),
        [username, password] if !username.starts_with("--") && !username.trim().is_empty() => {
            seed(username, password.clone()).await
        }
        _ => usage(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
