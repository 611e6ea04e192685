use crate::api::{ApiClient, LoginResponse};
use crate::cmd::Context;
use crate::data::{Session, User};
use anyhow::Result;

pub fn run_login(ctx: &Context, email: &str, password: &str) -> Result<()> {
    let client = ApiClient::new(ctx.settings(), &Session::default())?;
    let LoginResponse { token, user } = client.login(email, password)?;
    let session = Session::new(token, user);
    session.store(ctx.data_dir())?;
    if let Some(user) = &session.user {
        write_welcome(user, &mut std::io::stdout())?;
    }
    Ok(())
}

pub fn run_logout(ctx: &Context) -> Result<()> {
    let session = ctx.session()?;
    Session::clear(ctx.data_dir())?;
    match session.user {
        Some(user) => println!("Logged out {}.", user.email),
        None => println!("No session stored."),
    }
    Ok(())
}

pub(crate) fn write_welcome<W: std::io::Write>(user: &User, out: &mut W) -> Result<()> {
    let name = user.name.as_deref().unwrap_or(&user.email);
    writeln!(out, "Logged in as {name}")?;
    if let Some(role) = &user.role {
        writeln!(out, "Role: {role}")?;
    }
    if let Some(company) = &user.company_id {
        writeln!(out, "Company: {company}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{AppSettings, Id};
    use tempfile::TempDir;

    fn user(name: Option<&str>) -> User {
        User {
            id: Id::from("7"),
            email: "admin@demo.com".to_string(),
            name: name.map(str::to_string),
            company_id: Some(Id::from("3")),
            role: Some("ADMIN".to_string()),
        }
    }

    #[test]
    fn test_write_welcome_prefers_name() {
        let mut buf = Vec::new();
        write_welcome(&user(Some("Lucía")), &mut buf).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("Logged in as Lucía"));
        assert!(out.contains("Role: ADMIN"));
        assert!(out.contains("Company: 3"));
    }

    #[test]
    fn test_write_welcome_falls_back_to_email() {
        let mut buf = Vec::new();
        write_welcome(&user(None), &mut buf).unwrap();
        assert!(String::from_utf8(buf).unwrap().contains("Logged in as admin@demo.com"));
    }

    #[test]
    fn test_logout_removes_session_file() {
        let tmp = TempDir::new().unwrap();
        Session::new("tok".to_string(), user(None)).store(tmp.path()).unwrap();
        let ctx = Context::new(tmp.path().to_path_buf(), AppSettings::default());
        run_logout(&ctx).unwrap();
        assert!(!tmp.path().join("session.json").exists());
        assert!(!ctx.session().unwrap().is_authenticated());
    }
}
