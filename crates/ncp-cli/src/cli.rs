use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "ncp", version, about = "Generate and manage Nursing Care Plans")]
pub struct Cli {
    /// Backend URL; overrides the configured one.
    #[arg(long, global = true, env = "NCP_API_URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct AssessmentArgs {
    /// Assessment document (JSON, `"mode": "manual"` or `"assistant"`).
    #[arg(long, conflicts_with_all = ["subjective", "objective"])]
    pub input: Option<PathBuf>,
    /// Subjective lines, one finding per line.
    #[arg(long, requires = "objective")]
    pub subjective: Option<PathBuf>,
    /// Objective lines, one finding per line.
    #[arg(long, requires = "subjective")]
    pub objective: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show or change local settings
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Sign in with Cognito and store the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "NCP_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Revoke and forget the stored session
    Logout,
    /// Create an account; Cognito emails a confirmation code
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long, env = "NCP_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
    },
    /// Confirm a new account with the emailed code
    Confirm {
        #[arg(long)]
        email: String,
        #[arg(long)]
        code: String,
    },
    /// Request a reset code, or set a new password with --code
    ResetPassword {
        #[arg(long)]
        email: String,
        #[arg(long, requires = "new_password")]
        code: Option<String>,
        #[arg(long, env = "NCP_NEW_PASSWORD", hide_env_values = true)]
        new_password: Option<String>,
    },
    /// Show the signed-in user's profile
    Whoami,
    /// Check an assessment against the input rules without contacting the server
    Check(AssessmentArgs),
    /// Generate a care plan from an assessment
    Generate {
        #[command(flatten)]
        assessment: AssessmentArgs,
        /// Column count: 4, 5, 6 or 7.
        #[arg(long)]
        format: Option<u8>,
    },
    /// List saved care plans, newest first
    List,
    /// Print a saved care plan
    Show { id: Uuid },
    /// Change a care plan's title
    Rename { id: Uuid, title: String },
    /// Delete a care plan and its explanation
    Delete { id: Uuid },
    /// Validate a saved care plan's structure and diagnosis
    Validate { id: Uuid },
    /// Show the explanation of a care plan, generating it when missing
    Explain {
        id: Uuid,
        /// Generate a new explanation even if one exists.
        #[arg(long)]
        regenerate: bool,
    },
    /// Write a care plan to a file
    Export {
        id: Uuid,
        /// pdf, docx, csv, png or md.
        #[arg(long, default_value = "pdf")]
        format: String,
        /// Output path; defaults to a name derived from the diagnosis.
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Leave the explanation out.
        #[arg(long)]
        no_explanation: bool,
        /// Let the server render the file.
        #[arg(long)]
        remote: bool,
    },
    /// Administration (admin accounts only)
    #[command(subcommand)]
    Admin(AdminCommand),
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    Show,
    SetUrl { url: String },
    SetFormat { format: u8 },
    SetCognito {
        #[arg(long)]
        region: String,
        #[arg(long)]
        user_pool_id: String,
        #[arg(long)]
        client_id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum AdminCommand {
    /// Dashboard statistics
    Stats,
    Users,
    Suspend { user_id: String },
    Activate { user_id: String },
    /// Delete a user and every plan they own
    DeleteUser { user_id: String },
    /// Grant admin rights (super admin only)
    Promote {
        user_id: String,
        #[arg(long)]
        super_admin: bool,
    },
    /// Revoke admin rights (super admin only)
    Demote { user_id: String },
    Health,
    /// Show the active AI provider, or switch it with --set
    Provider {
        #[arg(long)]
        set: Option<String>,
    },
}
