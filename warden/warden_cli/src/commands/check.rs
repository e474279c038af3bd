//! The `check` command

use anyhow::Result;
use clap::{ArgGroup, Args};
use std::path::PathBuf;
use std::process::ExitCode;
use warden_core::{Attributes, Context, Decision};
use warden_policy::{AuthorizationConfig, AuthorizerDeps, AuthorizerRegistry};

/// Arguments for the check command
#[derive(Args)]
#[clap(group(ArgGroup::new("target").required(true).args(["resource", "path"])))]
pub struct CheckArgs {
    /// Path to the configuration file
    #[clap(long)]
    pub config: PathBuf,

    /// Requesting user
    #[clap(long)]
    pub user: String,

    /// Group of the requesting user; repeatable
    #[clap(long = "group")]
    pub groups: Vec<String>,

    /// Requested verb, e.g. get
    #[clap(long)]
    pub verb: String,

    /// Target resource type
    #[clap(long)]
    pub resource: Option<String>,

    /// Target subresource
    #[clap(long, requires = "resource")]
    pub subresource: Option<String>,

    /// Target object name
    #[clap(long, requires = "resource")]
    pub name: Option<String>,

    /// Target namespace
    #[clap(long, requires = "resource")]
    pub namespace: Option<String>,

    /// Target URL path for non-resource requests
    #[clap(long)]
    pub path: Option<String>,

    /// Print the decision as JSON
    #[clap(long)]
    pub json: bool,
}

impl CheckArgs {
    /// The request these arguments describe.
    pub fn attributes(&self) -> Attributes {
        let user = super::user_info(&self.user, &self.groups);

        match (&self.resource, &self.path) {
            (Some(resource), _) => {
                let namespace = self.namespace.clone().unwrap_or_default();
                let mut attrs = Attributes::resource(user, &self.verb, resource, namespace);
                if let Some(name) = &self.name {
                    attrs = attrs.with_name(name);
                }
                if let Some(subresource) = &self.subresource {
                    attrs = attrs.with_subresource(subresource);
                }
                attrs
            }
            (None, path) => {
                Attributes::non_resource(user, &self.verb, path.clone().unwrap_or_default())
            }
        }
    }
}

/// Implementation of the check command
pub fn execute(args: &CheckArgs, config: &AuthorizationConfig) -> Result<ExitCode> {
    let store = super::load_store(config)?;
    let deps = AuthorizerDeps::new().with_listers(super::listers(&store));
    let chain = AuthorizerRegistry::with_defaults().build_chain(config, &deps)?;

    let attrs = args.attributes();
    let result = chain.authorize(&Context::background(), &attrs)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", result);
    }

    Ok(match result.decision {
        Decision::Allow => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}
