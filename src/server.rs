use actix_web::http::StatusCode;
use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use tokio::sync::Semaphore;

use crate::config::Configuracion;
use crate::documento::{LibreOffice, MotorDocx};
use crate::error::NotadorError;
use crate::notador::{filtrar_estudiantes, Notador};

type NotadorDocx = Notador<MotorDocx<LibreOffice>>;

/// Limita las generaciones simultáneas al número de CPUs.
static GLOBAL_SEM: OnceLock<Arc<Semaphore>> = OnceLock::new();

fn semaforo() -> Arc<Semaphore> {
    GLOBAL_SEM
        .get_or_init(|| Arc::new(Semaphore::new(std::cmp::max(1, num_cpus::get()))))
        .clone()
}

fn respuesta_error(e: &NotadorError) -> HttpResponse {
    let status = match e {
        NotadorError::NoEncontrado { .. } | NotadorError::EstudianteNoEncontrado { .. } => {
            StatusCode::NOT_FOUND
        }
        NotadorError::Validacion(_) | NotadorError::NoConfigurado(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    HttpResponse::build(status).json(json!({"error": e.to_string(), "tipo": e.tipo()}))
}

fn notador_con(
    config: &Configuracion,
    excel: &str,
    plantilla: Option<&str>,
    salida: Option<&str>,
) -> Result<NotadorDocx, NotadorError> {
    let mut notador = Notador::desde_configuracion(config);
    notador.set_excel_file(excel)?;
    if let Some(p) = plantilla {
        notador.set_word_template(p)?;
    }
    if let Some(s) = salida {
        notador.set_output_folder(s);
    }
    Ok(notador)
}

#[derive(Deserialize)]
struct GradosQuery {
    excel: String,
}

/// GET /grados?excel=notas.xlsx
async fn grados_handler(
    config: web::Data<Configuracion>,
    query: web::Query<GradosQuery>,
) -> impl Responder {
    let resultado = notador_con(&config, &query.excel, None, None).and_then(|n| n.grados());
    match resultado {
        Ok(grados) => HttpResponse::Ok().json(json!({"grados": grados})),
        Err(e) => respuesta_error(&e),
    }
}

#[derive(Deserialize)]
struct EstudiantesQuery {
    excel: String,
    grado: String,
    buscar: Option<String>,
}

/// GET /estudiantes?excel=notas.xlsx&grado=7&buscar=perez
async fn estudiantes_handler(
    config: web::Data<Configuracion>,
    query: web::Query<EstudiantesQuery>,
) -> impl Responder {
    let resultado = notador_con(&config, &query.excel, None, None).and_then(|n| n.estudiantes(&query.grado));
    match resultado {
        Ok(lista) => {
            let lista = filtrar_estudiantes(&lista, query.buscar.as_deref().unwrap_or(""));
            HttpResponse::Ok().json(json!({"grado": query.grado, "estudiantes": lista}))
        }
        Err(e) => respuesta_error(&e),
    }
}

#[derive(Deserialize)]
struct ProcesarRequest {
    excel: String,
    plantilla: String,
    salida: PathBuf,
    grado: String,
    /// Sin `id` se procesa el grado completo (o `seleccion`).
    id: Option<String>,
    grupo: Option<String>,
    periodo: Option<String>,
    seleccion: Option<Vec<String>>,
}

/// POST /procesar
/// Genera un boletín (`id`) o un lote del grado. Corre en un hilo bloqueante
/// y cada tarea abre su propia sesión del motor.
async fn procesar_handler(
    config: web::Data<Configuracion>,
    body: web::Json<ProcesarRequest>,
) -> impl Responder {
    let req = body.into_inner();
    let start = std::time::Instant::now();

    let permit = match semaforo().acquire_owned().await {
        Ok(p) => p,
        Err(_) => {
            return HttpResponse::InternalServerError()
                .json(json!({"error": "failed to acquire semaphore"}));
        }
    };

    let config = config.into_inner();
    let blocking = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        let mut mensajes: Vec<String> = Vec::new();
        let mut progreso = |m: &str| mensajes.push(m.to_string());
        let notador = notador_con(&config, &req.excel, Some(&req.plantilla), None).map(|mut n| {
            n.set_output_folder(&req.salida);
            n
        })?;
        let valor = match &req.id {
            Some(id) => {
                let archivos = notador.procesar_estudiante(
                    id,
                    &req.grado,
                    req.grupo.as_deref(),
                    req.periodo.as_deref(),
                    Some(&mut progreso),
                )?;
                json!({"status": "ok", "archivos": archivos, "progreso": mensajes})
            }
            None => {
                let resumen = notador.procesar_grado(
                    &req.grado,
                    req.periodo.as_deref(),
                    req.seleccion.as_deref(),
                    Some(&mut progreso),
                )?;
                json!({"status": "ok", "resumen": resumen, "progreso": mensajes})
            }
        };
        Ok::<_, NotadorError>(valor)
    });

    let resultado = match blocking.await {
        Ok(r) => r,
        Err(e) => {
            return HttpResponse::InternalServerError()
                .json(json!({"error": format!("task join error: {}", e)}));
        }
    };
    tracing::info!("POST /procesar en {} ms", start.elapsed().as_millis());
    match resultado {
        Ok(valor) => HttpResponse::Ok().json(valor),
        Err(e) => respuesta_error(&e),
    }
}

#[derive(Deserialize)]
struct RevisarQuery {
    excel: String,
    plantilla: String,
    grado: String,
}

/// GET /revisar?excel=notas.xlsx&plantilla=boletin.docx&grado=7
async fn revisar_handler(
    config: web::Data<Configuracion>,
    query: web::Query<RevisarQuery>,
) -> impl Responder {
    let resultado = notador_con(&config, &query.excel, Some(&query.plantilla), None)
        .and_then(|n| n.diagnosticar_areas(&query.grado));
    match resultado {
        Ok(diag) => HttpResponse::Ok().json(diag),
        Err(e) => respuesta_error(&e),
    }
}

async fn help_handler() -> impl Responder {
    let help = json!({
        "description": "API para generar boletines desde una planilla de notas y una plantilla DOCX.",
        "endpoints": {
            "GET /grados": "?excel=<ruta xlsx>",
            "GET /estudiantes": "?excel=<ruta xlsx>&grado=<hoja>[&buscar=<texto>]",
            "POST /procesar": "JSON con excel, plantilla, salida, grado y opcionalmente id, grupo, periodo, seleccion",
            "GET /revisar": "?excel=<ruta xlsx>&plantilla=<ruta docx>&grado=<hoja>"
        },
        "post_example": {
            "excel": "notas.xlsx",
            "plantilla": "boletin.docx",
            "salida": "boletines",
            "grado": "7",
            "id": "123456789",
            "periodo": "1"
        },
        "note": "Sin 'id' se genera el grado completo; los fallos por estudiante se devuelven en 'resumen.fallas'."
    });

    HttpResponse::Ok().json(help)
}

pub async fn run_server(bind_addr: &str, config: Configuracion) -> std::io::Result<()> {
    let datos = web::Data::new(config);
    tracing::info!("Iniciando servidor en http://{}", bind_addr);
    HttpServer::new(move || {
        App::new()
            .app_data(datos.clone())
            .route("/grados", web::get().to(grados_handler))
            .route("/estudiantes", web::get().to(estudiantes_handler))
            .route("/procesar", web::post().to(procesar_handler))
            .route("/revisar", web::get().to(revisar_handler))
            .route("/help", web::get().to(help_handler))
    })
    .bind(bind_addr)?
    .run()
    .await
}
