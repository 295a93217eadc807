// src/middleware/flash.rs
//
// Mensagens "flash": gravadas num cookie curto antes do redirect e lidas
// (e apagadas) pela próxima página renderizada.

use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::{common::error::AppError, middleware::i18n::Locale};

pub const FLASH_COOKIE: &str = "fiado_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Info,
    Error,
}

impl Level {
    pub fn css(self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Info => "info",
            Level::Error => "error",
        }
    }
}

macro_rules! notices {
    ($($variant:ident => ($code:literal, $level:ident, $es:literal, $en:literal)),+ $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum Notice {
            $($variant),+
        }

        impl Notice {
            pub fn code(self) -> &'static str {
                match self { $(Notice::$variant => $code),+ }
            }

            pub fn from_code(code: &str) -> Option<Self> {
                match code {
                    $($code => Some(Notice::$variant),)+
                    _ => None,
                }
            }

            pub fn level(self) -> Level {
                match self { $(Notice::$variant => Level::$level),+ }
            }

            pub fn text_es(self) -> &'static str {
                match self { $(Notice::$variant => $es),+ }
            }

            pub fn text_en(self) -> &'static str {
                match self { $(Notice::$variant => $en),+ }
            }
        }
    };
}

notices! {
    LoginOk => ("login_ok", Success, "Inicio de sesión exitoso.", "Signed in successfully."),
    LoggedOut => ("logged_out", Info, "Sesión cerrada.", "Signed out."),
    BadCredentials => ("bad_credentials", Error, "Usuario o contraseña incorrectos.", "Incorrect username or password."),
    SessionExpired => ("session_expired", Info, "Tu sesión expiró. Ingresá de nuevo.", "Your session expired. Please sign in again."),
    Forbidden => ("forbidden", Error, "No tenés permiso para esa acción.", "You are not allowed to do that."),
    MovementSaved => ("movement_saved", Success, "Movimiento registrado correctamente.", "Movement recorded."),
    InvalidAmount => ("invalid_amount", Error, "El monto no es válido. Usá un número positivo con hasta 2 decimales.", "Invalid amount. Use a positive number with up to 2 decimals."),
    InvalidDate => ("invalid_date", Error, "La fecha no es válida.", "Invalid date."),
    InvalidKind => ("invalid_kind", Error, "El tipo debe ser Compra o Abono.", "Type must be Purchase or Payment."),
    MissingCustomer => ("missing_customer", Error, "Indicá el nombre del cliente.", "Enter the customer's name."),
    InvalidForm => ("invalid_form", Error, "Revisá los datos del formulario.", "Please check the form fields."),
    CustomerCreated => ("customer_created", Success, "Cliente creado.", "Customer created."),
    CustomerExists => ("customer_exists", Error, "Ya existe un cliente con ese nombre.", "A customer with that name already exists."),
    CustomerNotFound => ("customer_not_found", Error, "Cliente no encontrado.", "Customer not found."),
    UnknownCobrador => ("unknown_cobrador", Error, "El cobrador indicado no existe.", "That collector does not exist."),
    UnknownClientLogin => ("unknown_client_login", Error, "El usuario cliente indicado no existe.", "That client login does not exist."),
    UserCreated => ("user_created", Success, "Usuario creado.", "User created."),
    UsernameTaken => ("username_taken", Error, "Ese nombre de usuario ya está en uso.", "That username is already taken."),
    UserToggled => ("user_toggled", Success, "Estado del usuario actualizado.", "User status updated."),
    CannotDeactivateSelf => ("cannot_deactivate_self", Error, "No podés desactivar tu propio usuario.", "You cannot deactivate yourself."),
    PasswordReset => ("password_reset", Success, "Contraseña restablecida.", "Password reset."),
    PasswordChanged => ("password_changed", Success, "Contraseña actualizada.", "Password changed."),
    WrongCurrentPassword => ("wrong_current_password", Error, "La contraseña actual no es correcta.", "Current password is incorrect."),
    ResetTokenInvalid => ("reset_token_invalid", Error, "Token de recuperación inválido.", "Invalid recovery token."),
    ExportFailed => ("export_failed", Error, "No se pudo generar el estado de cuenta.", "Could not generate the statement."),
    InternalError => ("internal_error", Error, "Ocurrió un error interno. Intentá de nuevo.", "An internal error occurred. Please try again."),
}

impl Notice {
    pub fn text(self, locale: &Locale) -> &'static str {
        match locale.0.as_str() {
            "en" => self.text_en(),
            _ => self.text_es(),
        }
    }
}

fn flash_cookie(value: String) -> Cookie<'static> {
    Cookie::build((FLASH_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Grava o aviso para a próxima página.
pub fn set(jar: CookieJar, notice: Notice) -> CookieJar {
    jar.add(flash_cookie(notice.code().to_string()))
}

/// Lê e consome o aviso pendente.
pub fn take(jar: CookieJar) -> (CookieJar, Option<Notice>) {
    let notice = jar
        .get(FLASH_COOKIE)
        .and_then(|c| Notice::from_code(c.value()));
    match notice {
        Some(_) => (jar.remove(flash_cookie(String::new())), notice),
        None => (jar, None),
    }
}

/// Redirect 303 com aviso.
pub fn redirect(jar: CookieJar, notice: Notice, to: &str) -> Response {
    (set(jar, notice), Redirect::to(to)).into_response()
}

/// Fronteira de erro das páginas HTML: loga, avisa e redireciona.
pub fn bounce(jar: CookieJar, err: &AppError, to: &str) -> Response {
    if err.is_internal() {
        tracing::error!("Erro tratado no handler: {}", err);
    } else {
        tracing::warn!("Requisição rejeitada: {}", err);
    }
    redirect(jar, err.notice(), to)
}

/// Aviso já pronto para o template.
pub struct FlashView {
    pub level: &'static str,
    pub text: &'static str,
}

impl FlashView {
    pub fn new(notice: Notice, locale: &Locale) -> Self {
        FlashView { level: notice.level().css(), text: notice.text(locale) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, StatusCode};

    #[test]
    fn codes_round_trip() {
        for notice in [Notice::LoginOk, Notice::BadCredentials, Notice::InternalError] {
            assert_eq!(Notice::from_code(notice.code()), Some(notice));
        }
        assert_eq!(Notice::from_code("nope"), None);
    }

    #[test]
    fn text_follows_locale() {
        let es = Locale("es".into());
        let en = Locale("en".into());
        let fr = Locale("fr".into());
        assert_eq!(Notice::BadCredentials.text(&es), "Usuario o contraseña incorrectos.");
        assert_eq!(Notice::BadCredentials.text(&en), "Incorrect username or password.");
        assert_eq!(Notice::BadCredentials.text(&fr), Notice::BadCredentials.text(&es));
    }

    #[test]
    fn take_consumes_pending_notice() {
        let jar = set(CookieJar::new(), Notice::MovementSaved);
        let (jar, notice) = take(jar);
        assert_eq!(notice, Some(Notice::MovementSaved));
        assert!(jar.get(FLASH_COOKIE).is_none());
    }

    #[test]
    fn redirect_sets_cookie_and_location() {
        let response = redirect(CookieJar::new(), Notice::Forbidden, "/");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("fiado_flash=forbidden"));
    }
}
