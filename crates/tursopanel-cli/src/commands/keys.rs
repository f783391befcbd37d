//! Key management commands.
//!
//! `tursopanel keys generate` - Generate a new Ed25519 signing keypair.

use crate::KeyMethod;
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use tursopanel_token::{KeyPair, OpensslKeyGenerator};

/// Generate a new signing keypair.
pub fn generate(output: Option<PathBuf>, method: KeyMethod, openssl: &Path) -> anyhow::Result<()> {
    let keypair = match method {
        KeyMethod::Random => KeyPair::generate(),
        KeyMethod::Openssl => OpensslKeyGenerator::new(openssl)?
            .generate()
            .with_context(|| format!("Failed to generate a key with {}", openssl.display()))?,
    };

    if let Some(output_dir) = output {
        fs::create_dir_all(&output_dir)?;

        let private_path = output_dir.join("private.key");
        let public_path = output_dir.join("public.key");
        keypair.save_to_files(&private_path, &public_path)?;

        println!("✔ Generated Ed25519 keypair (kid {}):", keypair.key_id());
        println!("  Private key: {}", private_path.display());
        println!("  Public key:  {}", public_path.display());
        println!();
        println!("⚠️  Keep your private key secure! Never commit it to version control.");
        println!();
        println!("Reference it from tursopanel.yaml:");
        println!("  signing:");
        println!("    private_key_file: {}", private_path.display());
        println!("Or set it as an environment variable:");
        println!(
            "  export TURSOPANEL_SIGNING_KEY=$(cat {})",
            private_path.display()
        );
    } else {
        println!("Private key (keep secure!):");
        println!("{}", keypair.private_key_hex());
        println!();
        println!("Public key (kid {}):", keypair.key_id());
        println!("{}", keypair.public_key_hex());
        println!();
        println!("Use --output <dir> to save keys to files.");
    }

    Ok(())
}
