// src/services/password.rs

use std::sync::LazyLock;

use crate::common::error::AppError;

/// bcrypt só considera os primeiros 72 bytes da senha.
pub const BCRYPT_MAX_BYTES: usize = 72;

// Hash usado quando o usuário não existe, para que o tempo de resposta
// seja o mesmo de uma senha errada.
static DUMMY_HASH: LazyLock<String> = LazyLock::new(|| {
    bcrypt::hash("fiado-dummy-password", bcrypt::DEFAULT_COST).unwrap_or_default()
});

/// Maior prefixo com até 72 bytes que termina em fronteira de caractere.
/// Aplicado igual na criação e na verificação do hash.
pub fn truncate_secret(secret: &str) -> &str {
    if secret.len() <= BCRYPT_MAX_BYTES {
        return secret;
    }
    let mut end = BCRYPT_MAX_BYTES;
    while !secret.is_char_boundary(end) {
        end -= 1;
    }
    &secret[..end]
}

pub fn hash_secret_with_cost(secret: &str, cost: u32) -> Result<String, AppError> {
    Ok(bcrypt::hash(truncate_secret(secret), cost)?)
}

/// Nunca falha: hash vazio, malformado ou erro do bcrypt contam como senha errada.
pub fn verify_secret(secret: &str, stored_hash: &str) -> bool {
    if stored_hash.trim().is_empty() {
        tracing::warn!("Hash de senha vazio; tratando como credencial inválida");
        return false;
    }
    match bcrypt::verify(truncate_secret(secret), stored_hash) {
        Ok(valid) => valid,
        Err(e) => {
            tracing::warn!("Erro verificando hash de senha: {}", e);
            false
        }
    }
}

/// Versões assíncronas: bcrypt é caro, então roda no pool de threads bloqueantes.
pub async fn hash_secret(secret: &str) -> Result<String, AppError> {
    let secret = secret.to_owned();
    tokio::task::spawn_blocking(move || hash_secret_with_cost(&secret, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))?
}

pub async fn verify_secret_blocking(secret: &str, stored_hash: Option<&str>) -> Result<bool, AppError> {
    let secret = secret.to_owned();
    let stored_hash = stored_hash.map(str::to_owned);

    let is_valid = tokio::task::spawn_blocking(move || match stored_hash {
        Some(hash) => verify_secret(&secret, &hash),
        None => {
            // Usuário inexistente: gasta o mesmo tempo e falha
            let _ = verify_secret(&secret, &DUMMY_HASH);
            false
        }
    })
    .await
    .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))?;

    Ok(is_valid)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Custo mínimo para os testes não demorarem
    const TEST_COST: u32 = 4;

    #[test]
    fn hash_then_verify_round_trips() {
        let hash = hash_secret_with_cost("cocina2024", TEST_COST).unwrap();
        assert!(verify_secret("cocina2024", &hash));
        assert!(!verify_secret("cocina2025", &hash));
        assert!(!verify_secret("", &hash));
    }

    #[test]
    fn malformed_or_empty_hash_is_a_non_match() {
        assert!(!verify_secret("cocina2024", ""));
        assert!(!verify_secret("cocina2024", "   "));
        assert!(!verify_secret("cocina2024", "not-a-bcrypt-hash"));
        assert!(!verify_secret("cocina2024", "$2b$12$short"));
    }

    #[test]
    fn short_secret_is_untouched() {
        assert_eq!(truncate_secret("abc"), "abc");
        let exact = "a".repeat(BCRYPT_MAX_BYTES);
        assert_eq!(truncate_secret(&exact), exact);
        assert_eq!(truncate_secret(truncate_secret(&exact)), exact);
    }

    #[test]
    fn truncation_never_splits_a_multibyte_character() {
        // 71 bytes ASCII + "ñ" (2 bytes) = 73 bytes
        let secret = format!("{}ñ", "a".repeat(71));
        let truncated = truncate_secret(&secret);
        assert_eq!(truncated.len(), 71);
        assert!(!truncated.contains('ñ'));

        // "€" tem 3 bytes: 70 + 3 = 73 -> corta em 70
        let secret = format!("{}€xyz", "b".repeat(70));
        assert_eq!(truncate_secret(&secret).len(), 70);

        // Reaplicar é idempotente
        assert_eq!(truncate_secret(truncated), truncated);
    }

    #[test]
    fn long_secret_verifies_like_its_truncated_prefix() {
        let secret = format!("{}ñandú", "x".repeat(70));
        let hash = hash_secret_with_cost(&secret, TEST_COST).unwrap();

        assert!(verify_secret(&secret, &hash));
        assert!(verify_secret(truncate_secret(&secret), &hash));

        let direct = hash_secret_with_cost(truncate_secret(&secret), TEST_COST).unwrap();
        assert!(verify_secret(&secret, &direct));
    }

    #[tokio::test]
    async fn unknown_user_path_returns_false() {
        assert!(!verify_secret_blocking("cualquiera", None).await.unwrap());

        let hash = hash_secret("cocina2024").await.unwrap();
        assert!(verify_secret_blocking("cocina2024", Some(&hash)).await.unwrap());
    }
}
