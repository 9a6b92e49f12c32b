use colored::Colorize;

use crate::{
    app::{AppContext, Config},
    session::{Phase, Session},
    utils::RapportError,
};

use super::Commands;

/// Handle a CLI subcommand against a bootstrapped context
pub async fn handle_command(context: &AppContext, command: &Commands) -> Result<(), RapportError> {
    let controller = context.controller();

    match command {
        Commands::Init => {
            // Handled before the context exists
            Ok(())
        }
        Commands::Status => {
            println!("{}", render_session(&context.session()));
            println!("  API: {}", context.config().api.base_url);
            Ok(())
        }
        Commands::Login { identifier, secret } => {
            let user = controller.login(identifier, secret).await?;
            println!("Signed in as {}", user.display_name().green());
            Ok(())
        }
        Commands::Register {
            email,
            full_name,
            secret,
        } => {
            let user = controller.register(email, secret, full_name).await?;
            println!(
                "Account created. Signed in as {}",
                user.display_name().green()
            );
            Ok(())
        }
        Commands::Logout => {
            controller.logout();
            println!("Signed out");
            Ok(())
        }
        Commands::Upgrade => {
            match controller.upgrade_to_pro()? {
                Some(user) => println!("{} is now {}", user.display_name(), "Pro".yellow()),
                None => println!("Not signed in; nothing to upgrade"),
            }
            Ok(())
        }
        Commands::Token => {
            match controller.token()? {
                Some(token) if context.session().is_authenticated() => println!("{}", token),
                _ => return Err(RapportError::NotSignedIn),
            }
            Ok(())
        }
    }
}

/// One-screen summary of the session
pub fn render_session(session: &Session) -> String {
    let Some(user) = &session.user else {
        return format!("{} Not signed in", "[-]".dimmed());
    };

    let badge = match session.phase {
        Phase::Confirmed => "[OK]".green(),
        _ => "[?]".yellow(),
    };
    let plan = if user.is_pro {
        "Pro".yellow()
    } else {
        "Free".normal()
    };

    let mut out = format!(
        "{} {} <{}>\n  Plan: {}",
        badge,
        user.display_name(),
        user.email,
        plan
    );
    if session.phase == Phase::Tentative {
        out.push_str("\n  Could not reach the server; showing cached identity");
    }
    out
}

/// Apply command-line overrides on top of loaded configuration
pub fn apply_overrides(mut config: Config, api_url: Option<&str>) -> Config {
    if let Some(url) = api_url {
        config.api.base_url = url.to_string();
    }
    config
}
