// Biblioteca raíz del crate `notador`.
// Genera boletines académicos por estudiante a partir de una planilla de
// notas y una plantilla Word, con exportación a PDF.
pub mod areas;
pub mod config;
pub mod documento;
pub mod error;
pub mod estadisticas;
pub mod excel;
pub mod identidad;
pub mod models;
pub mod notador;
pub mod server;

pub use config::{Configuracion, TablasMapeo};
pub use error::{NotadorError, Result};
pub use notador::{filtrar_estudiantes, Hito, Notador};

/// Ejecuta el servidor HTTP (reexport para facilitar uso desde `main`)
pub use server::run_server;
