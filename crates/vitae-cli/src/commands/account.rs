use anyhow::{Context, Result};
use vitae_application::EditingContext;
use vitae_infrastructure::http::HttpAuthClient;

pub async fn register(auth: &HttpAuthClient, email: &str, password: &str) -> Result<()> {
    auth.register(email, password)
        .await
        .context("Registration failed")?;
    println!("✅ Registered {}. Sign in with `vitae login`.", email);
    Ok(())
}

pub async fn login(
    ctx: &EditingContext,
    auth: &HttpAuthClient,
    username: &str,
    password: &str,
) -> Result<()> {
    let token = auth
        .login(username, password)
        .await
        .context("Sign-in failed")?;
    ctx.gate()
        .login(token.access_token, username)
        .await
        .context("Failed to store the session")?;
    println!("✅ Signed in as {}", username);
    Ok(())
}

pub async fn logout(ctx: &EditingContext) -> Result<()> {
    ctx.logout().await?;
    println!("👋 Signed out");
    Ok(())
}

pub fn whoami(ctx: &EditingContext) {
    match ctx.gate().user() {
        Some(user) if ctx.gate().is_authenticated() => println!("{}", user.email),
        _ => println!("Not signed in"),
    }
}
