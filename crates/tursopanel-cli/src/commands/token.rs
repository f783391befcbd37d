//! Token management commands.
//!
//! `tursopanel token mint` - Mint a full-access / read-only token pair.
//! `tursopanel token verify` - Verify a token's signature and expiry.
//! `tursopanel token inspect` - Decode a token without verification.

use anyhow::Context;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tursopanel_core::PanelConfig;
use tursopanel_store::Store;
use tursopanel_token::keys::{load_public_key_file, load_public_key_hex};
use tursopanel_token::{
    Expiry, Grantee, KeyPair, NoDirectory, PublicKey, ScopeResolver, Subject, Target, TokenMinter,
    TokenPair, TokenScope, TokenVerifier, inspect_token_unverified,
};

/// Resolve a private key from either a file path or inline key material.
///
/// Falls back to the `signing` section of `config` when no key is passed.
fn resolve_private_key(
    key: Option<String>,
    config: Option<&PanelConfig>,
) -> anyhow::Result<KeyPair> {
    let key_str = match key {
        Some(key) => key,
        None => config
            .map(|c| c.signing.resolve_private_key())
            .transpose()
            .context("Failed to read the configured signing key")?
            .flatten()
            .context(
                "Private key not provided. Pass --key <path>, set TURSOPANEL_SIGNING_KEY, \
                 or configure signing.private_key_file",
            )?,
    };

    let path = Path::new(&key_str);
    if path.exists() {
        return KeyPair::load_from_file(path)
            .with_context(|| format!("Failed to load private key from file: {}", path.display()));
    }

    KeyPair::parse(&key_str).context(
        "Failed to parse private key. Expected a hex-encoded seed or a PKCS#8 PEM document",
    )
}

/// Resolve a public key from either a file path or a hex-encoded string.
///
/// Falls back to `signing.public_key_file` in `config` when no key is passed.
fn resolve_public_key(
    key: Option<String>,
    config: Option<&PanelConfig>,
) -> anyhow::Result<PublicKey> {
    let key_str = match key {
        Some(key) => key,
        None => config
            .map(|c| c.signing.resolve_public_key())
            .transpose()
            .context("Failed to read the configured public key")?
            .flatten()
            .context(
                "Public key not provided. Pass --key <path>, set TURSOPANEL_PUBLIC_KEY, \
                 or configure signing.public_key_file",
            )?,
    };

    let path = Path::new(&key_str);
    if path.exists() {
        return load_public_key_file(path)
            .with_context(|| format!("Failed to load public key from file: {}", path.display()));
    }

    load_public_key_hex(key_str.trim())
        .context("Failed to parse public key. Expected hex-encoded Ed25519 public key")
}

/// Load a token from a file if the argument names one.
fn read_token(token: String) -> anyhow::Result<String> {
    if Path::new(&token).exists() {
        Ok(fs::read_to_string(&token)?.trim().to_string())
    } else {
        Ok(token)
    }
}

/// Build the mint target from the mutually exclusive `--database*` / `--group*` flags.
pub fn target_from_args(
    database: Option<String>,
    database_id: Option<u64>,
    group: Option<String>,
    group_id: Option<u64>,
) -> anyhow::Result<Target> {
    match (database, database_id, group, group_id) {
        (Some(name), None, None, None) => Ok(Target::Database(Subject::Name(name))),
        (None, Some(id), None, None) => Ok(Target::Database(Subject::Id(id))),
        (None, None, Some(name), None) => Ok(Target::Group(Subject::Name(name))),
        (None, None, None, Some(id)) => Ok(Target::Group(Subject::Id(id))),
        _ => anyhow::bail!(
            "Exactly one of --database, --database-id, --group or --group-id is required"
        ),
    }
}

/// Build the grantee from the mutually exclusive `--user` / `--team` flags.
pub fn grantee_from_args(user: Option<u64>, team: Option<u64>) -> anyhow::Result<Grantee> {
    let grantee = match (user, team) {
        (Some(id), None) => Grantee::User(id),
        (None, Some(id)) => Grantee::Group(id),
        _ => anyhow::bail!("Exactly one of --user or --team is required"),
    };
    if grantee.uid() == 0 && grantee.gid() == 0 {
        anyhow::bail!("The grantee id must be a positive integer");
    }
    Ok(grantee)
}

/// Mint a token pair; id targets are resolved through the configured store.
pub async fn mint_pair(
    keypair: KeyPair,
    target: Target,
    grantee: Grantee,
    days: u32,
    config: Option<&PanelConfig>,
) -> anyhow::Result<TokenPair> {
    let scope = TokenScope { target, grantee };

    let resolved = match (scope.target.subject(), config) {
        (Subject::Id(_), Some(config)) => {
            let store = Store::open(&config.storage)
                .await
                .with_context(|| {
                    format!("Failed to open store at {}", config.storage.path.display())
                })?;
            ScopeResolver::resolve(&scope, &store).await?
        }
        (Subject::Id(_), None) => {
            anyhow::bail!("--config is required to look up databases or groups by id")
        }
        (Subject::Name(_), _) => ScopeResolver::resolve(&scope, &NoDirectory).await?,
    };

    let pair = TokenMinter::new(keypair).mint_pair(&resolved, Expiry::from_days(days))?;
    Ok(pair)
}

/// Mint a token pair and print it as JSON.
pub async fn mint(
    key: Option<String>,
    target: Target,
    grantee: Grantee,
    days: u32,
    config_path: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let keypair = resolve_private_key(key, config.as_ref())?;
    let kid = keypair.key_id();
    let pair = mint_pair(keypair, target, grantee, days, config.as_ref()).await?;

    let output = json!({
        "subject": pair.claims.id,
        "is_group": pair.is_group,
        "kid": kid,
        "expiration_days": pair.expiry.days(),
        "expires_at": pair.expires_at,
        "full_access_token": pair.full_access,
        "read_only_token": pair.read_only,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

/// Inspect a token without verification.
pub fn inspect(token: String) -> anyhow::Result<()> {
    let token_str = read_token(token)?;
    let info = inspect_token_unverified(&token_str)?;

    println!("Token Information:");
    println!("{}", serde_json::to_string_pretty(&info)?);
    if info.claims.is_expired() {
        println!();
        println!("⚠️  Token expired at {}", info.claims.exp);
    }

    Ok(())
}

/// Load the configuration file when one was given.
fn load_config(config_path: Option<PathBuf>) -> anyhow::Result<Option<PanelConfig>> {
    config_path
        .map(|path| {
            PanelConfig::load_with_context(&path)
                .with_context(|| format!("Failed to load config: {}", path.display()))
        })
        .transpose()
}

/// Verify a token is valid.
pub fn verify(
    public_key: Option<String>,
    config_path: Option<PathBuf>,
    token: String,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let public_key = resolve_public_key(public_key, config.as_ref())?;
    let verifier = TokenVerifier::for_key(public_key);
    let token_str = read_token(token)?;

    let verified = verifier
        .verify(&token_str)
        .context("✖ Token verification failed")?;

    println!("✔ Token is valid");
    println!();
    println!("Token Details:");
    println!(
        "  {}: {}",
        if verified.is_group { "Group" } else { "Database" },
        verified.claims.id
    );
    println!("  Access: {:?}", verified.claims.access_level());
    match verified.claims.grantee() {
        Some(Grantee::User(id)) => println!("  Grantee: user {id}"),
        Some(Grantee::Group(id)) => println!("  Grantee: team {id}"),
        None => println!("  Grantee: (none)"),
    }
    if let Some(expires_at) = verified.claims.expires_at() {
        println!("  Expires: {}", expires_at.to_rfc3339());
    }
    println!("  Key id: {}", verified.kid);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tursopanel_token::AccessLevel;

    #[test]
    fn test_target_flags_are_exclusive() {
        assert_eq!(
            target_from_args(Some("orders".into()), None, None, None).unwrap(),
            Target::Database(Subject::Name("orders".into()))
        );
        assert_eq!(
            target_from_args(None, None, None, Some(3)).unwrap(),
            Target::Group(Subject::Id(3))
        );
        assert!(target_from_args(Some("a".into()), None, Some("b".into()), None).is_err());
        assert!(target_from_args(None, None, None, None).is_err());
    }

    #[test]
    fn test_grantee_flags() {
        assert_eq!(grantee_from_args(Some(42), None).unwrap(), Grantee::User(42));
        assert_eq!(grantee_from_args(None, Some(7)).unwrap(), Grantee::Group(7));
        assert!(grantee_from_args(Some(1), Some(2)).is_err());
        assert!(grantee_from_args(Some(0), None).is_err());
    }

    #[tokio::test]
    async fn test_mint_by_name_and_verify_with_file_key() {
        let dir = tempdir().unwrap();
        let keypair = KeyPair::generate();
        let public_path = dir.path().join("public.key");
        fs::write(&public_path, keypair.public_key_hex()).unwrap();

        let pair = mint_pair(
            keypair,
            Target::Database(Subject::Name("db-testing".into())),
            Grantee::User(42),
            30,
            None,
        )
        .await
        .unwrap();

        let token_path = dir.path().join("token.jwt");
        fs::write(&token_path, &pair.read_only).unwrap();
        verify(
            Some(public_path.to_string_lossy().to_string()),
            None,
            token_path.to_string_lossy().to_string(),
        )
        .unwrap();

        let public_key =
            resolve_public_key(Some(public_path.to_string_lossy().to_string()), None).unwrap();
        let verified = TokenVerifier::for_key(public_key).verify(&pair.read_only).unwrap();
        assert_eq!(verified.claims.id, "db-testing");
        assert_eq!(verified.claims.access_level(), AccessLevel::ReadOnly);
    }

    #[tokio::test]
    async fn test_mint_by_id_requires_config() {
        let err = mint_pair(
            KeyPair::generate(),
            Target::Database(Subject::Id(1)),
            Grantee::User(1),
            30,
            None,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("--config"));
    }

    #[tokio::test]
    async fn test_mint_by_id_resolves_through_store() {
        let dir = tempdir().unwrap();
        let mut config = PanelConfig::default();
        config.storage.path = dir.path().join("panel.sqlite");

        let store = Store::open(&config.storage).await.unwrap();
        let owner = store.create_user("alice", "wonderland", false).await.unwrap();
        let db = store
            .create_database(&tursopanel_store::NewDatabase {
                name: "orders".to_string(),
                owner_id: owner.id,
                group_id: None,
                is_schema: false,
                schema_name: None,
            })
            .await
            .unwrap();
        drop(store);

        let pair = mint_pair(
            KeyPair::generate(),
            Target::Database(Subject::Id(db.id as u64)),
            Grantee::User(owner.id as u64),
            0,
            Some(&config),
        )
        .await
        .unwrap();
        assert_eq!(pair.claims.id, "orders");
        assert_eq!(pair.expiry, Expiry::Unlimited);
    }

    #[test]
    fn test_resolve_private_key_from_hex_and_config() {
        let dir = tempdir().unwrap();
        let keypair = KeyPair::generate();

        let from_hex = resolve_private_key(Some(keypair.private_key_hex()), None).unwrap();
        assert_eq!(from_hex.public_key_hex(), keypair.public_key_hex());

        let key_path = dir.path().join("private.key");
        fs::write(&key_path, keypair.private_key_hex()).unwrap();
        let mut config = PanelConfig::default();
        config.signing.private_key_file = Some(key_path);
        let from_config = resolve_private_key(None, Some(&config)).unwrap();
        assert_eq!(from_config.public_key_hex(), keypair.public_key_hex());

        assert!(resolve_private_key(None, None).is_err());
    }

    #[tokio::test]
    async fn test_verify_falls_back_to_configured_public_key() {
        let dir = tempdir().unwrap();
        let keypair = KeyPair::generate();
        let public_path = dir.path().join("public.key");
        fs::write(&public_path, format!("{}\n", keypair.public_key_hex())).unwrap();

        let config_path = dir.path().join("tursopanel.yaml");
        fs::write(
            &config_path,
            format!(
                "storage:\n  path: panel.sqlite\nsigning:\n  public_key_file: {}\n",
                public_path.display()
            ),
        )
        .unwrap();

        let pair = mint_pair(
            keypair,
            Target::Database(Subject::Name("orders".into())),
            Grantee::User(1),
            1,
            None,
        )
        .await
        .unwrap();

        verify(None, Some(config_path.clone()), pair.full_access.clone()).unwrap();

        let config = load_config(Some(config_path)).unwrap().unwrap();
        let resolved = resolve_public_key(None, Some(&config)).unwrap();
        assert!(TokenVerifier::for_key(resolved).verify(&pair.read_only).is_ok());

        assert!(resolve_public_key(None, Some(&PanelConfig::default())).is_err());
    }

    #[tokio::test]
    async fn test_mint_rejects_out_of_range_days() {
        let err = mint_pair(
            KeyPair::generate(),
            Target::Database(Subject::Name("orders".into())),
            Grantee::User(1),
            u32::MAX,
            None,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_verify_rejects_foreign_key() {
        let signer = KeyPair::generate();
        let other = KeyPair::generate();
        let rt = tokio::runtime::Runtime::new().unwrap();
        let pair = rt
            .block_on(mint_pair(
                signer,
                Target::Group(Subject::Name("eu".into())),
                Grantee::Group(9),
                7,
                None,
            ))
            .unwrap();

        assert!(verify(Some(other.public_key_hex()), None, pair.full_access.clone()).is_err());
        inspect(pair.full_access).unwrap();
    }
}
