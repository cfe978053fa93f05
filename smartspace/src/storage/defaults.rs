//! Built-in seed data for the well-known profiles

use chrono::NaiveTime;

use crate::models::{
    Device, DeviceKind, DeviceStatus, Priority, ProfileId, Routine, RoutineKind, Schedule,
    Telemetry,
};

/// Default devices for a profile; unknown profiles have none
#[rustfmt::skip]
pub fn default_devices(profile: &ProfileId) -> Vec<Device> {
    match profile.as_str() {
        ProfileId::HOME => vec![
            device(1, "Sistema de Iluminación", DeviceKind::Light, "Philips Hue", "General",
                &[("brightness", 80.0), ("power", 15.0)]),
            device(2, "Termostato", DeviceKind::Climate, "Nest", "General",
                &[("temperature", 22.0)]),
            device(3, "Sistema de Seguridad", DeviceKind::Security, "Ring", "General",
                &[("battery", 95.0)]),
        ],
        ProfileId::OFFICE => vec![
            device(1, "Control de Acceso", DeviceKind::Security, "HID", "Entrada",
                &[("battery", 100.0)]),
            device(2, "AC Central", DeviceKind::Climate, "Daikin", "General",
                &[("temperature", 23.0)]),
            device(3, "Proyector Sala Principal", DeviceKind::Entertainment, "Epson",
                "Sala de Reuniones", &[("power", 200.0)]),
        ],
        _ => Vec::new(),
    }
}

/// Default routines for a profile; unknown profiles have none
#[rustfmt::skip]
pub fn default_routines(profile: &ProfileId) -> Vec<Routine> {
    const HOME_DEVICES: &[&str] = &["Sistema de Iluminación", "Termostato", "Sistema de Seguridad"];
    const OFFICE_DEVICES: &[&str] = &["Control de Acceso", "AC Central", "Proyector Sala Principal"];

    match profile.as_str() {
        ProfileId::HOME => vec![
            routine(1, "Buenos días", "Rutina matutina para comenzar el día", RoutineKind::Morning,
                at(7, 0), Priority::High, HOME_DEVICES,
                &["Hora: 7:00 AM", "Día laborable"],
                &["Encender luces gradualmente", "Ajustar temperatura a 22°C", "Desactivar sistema de alarma"]),
            routine(2, "Modo nocturno", "Preparar la casa para la noche", RoutineKind::Night,
                at(23, 0), Priority::High, HOME_DEVICES,
                &["Hora: 11:00 PM"],
                &["Atenuar luces al 30%", "Activar sistema de seguridad", "Ajustar temperatura a 20°C"]),
            routine(3, "Modo ausente", "Activar modo de ahorro y seguridad", RoutineKind::Away,
                Schedule::Manual, Priority::High, HOME_DEVICES,
                &["Activación manual", "Sensor de movimiento: sin actividad"],
                &["Apagar todas las luces", "Activar cámaras y sensores", "Activar modo ahorro de energía"]),
        ],
        ProfileId::OFFICE => vec![
            routine(1, "Inicio laboral", "Preparar la oficina para el día laboral", RoutineKind::WorkStart,
                at(8, 0), Priority::High, OFFICE_DEVICES,
                &["Hora: 8:00 AM", "Día laborable"],
                &["Desbloquear puertas principales", "Encender luces oficinas", "Ajustar temperatura a 23°C"]),
            routine(2, "Sala de reuniones", "Configurar sala para reuniones", RoutineKind::Meeting,
                Schedule::Manual, Priority::Medium, &["AC Central", "Proyector Sala Principal"],
                &["Reserva de sala confirmada"],
                &["Encender proyector", "Ajustar iluminación al 70%", "Ajustar temperatura sala"]),
            routine(3, "Cierre", "Cerrar la oficina de forma segura", RoutineKind::Closing,
                at(18, 0), Priority::High, OFFICE_DEVICES,
                &["Hora: 6:00 PM", "Día laborable"],
                &["Apagar todos los sistemas", "Activar sistema de alarmas", "Bloquear accesos"]),
        ],
        _ => Vec::new(),
    }
}

fn device(
    id: u64,
    name: &str,
    kind: DeviceKind,
    brand: &str,
    location: &str,
    metrics: &[(&str, f64)],
) -> Device {
    let data: Telemetry = metrics
        .iter()
        .map(|(metric, value)| (metric.to_string(), *value))
        .collect();
    Device {
        id,
        name: name.to_string(),
        kind,
        status: DeviceStatus::Online,
        brand: brand.to_string(),
        location: location.to_string(),
        data: Some(data),
    }
}

#[allow(clippy::too_many_arguments)]
fn routine(
    id: u64,
    name: &str,
    description: &str,
    kind: RoutineKind,
    schedule: Schedule,
    priority: Priority,
    devices: &[&str],
    conditions: &[&str],
    actions: &[&str],
) -> Routine {
    let owned = |items: &[&str]| -> Vec<String> { items.iter().map(|s| s.to_string()).collect() };
    Routine {
        id,
        name: name.to_string(),
        description: description.to_string(),
        active: true,
        kind,
        schedule,
        priority,
        devices: owned(devices),
        conditions: owned(conditions),
        actions: owned(actions),
    }
}

fn at(hour: u32, minute: u32) -> Schedule {
    NaiveTime::from_hms_opt(hour, minute, 0)
        .map(Schedule::At)
        .unwrap_or(Schedule::Manual)
}
