//! Event translator - raw hardware event to canonical event
//!
//! Dispatch is an exhaustive match over `SensorKind`; adding a kind fails to
//! compile until it is mapped here.

use contracts::{
    CanonicalSensorEvent, EventSource, RawSensorEvent, SensorKind, SensorPayload, SensorVector,
    UncalibratedVector,
};

/// Translate a raw event of a recognized kind.
///
/// Header fields are copied verbatim for every kind.
pub fn translate(raw: &RawSensorEvent, kind: SensorKind) -> CanonicalSensorEvent {
    CanonicalSensorEvent {
        source: EventSource::Android,
        version: raw.version,
        sensor: raw.sensor,
        sensor_type: raw.type_tag,
        timestamp: raw.timestamp,
        payload: payload(raw, kind),
    }
}

/// Translate if the type tag is recognized, `None` otherwise
pub fn translate_event(raw: &RawSensorEvent) -> Option<CanonicalSensorEvent> {
    raw.kind().map(|kind| translate(raw, kind))
}

fn payload(raw: &RawSensorEvent, kind: SensorKind) -> SensorPayload {
    match kind {
        SensorKind::Accelerometer => SensorPayload::Acceleration(vector(raw)),
        SensorKind::MagneticField => SensorPayload::Magnetic(vector(raw)),
        SensorKind::MagneticFieldUncalibrated => {
            SensorPayload::MagneticUncalibrated(uncalibrated(raw))
        }
        SensorKind::Gyroscope => SensorPayload::Gyro(vector(raw)),
        SensorKind::GyroscopeUncalibrated => SensorPayload::GyroUncalibrated(uncalibrated(raw)),
        SensorKind::Proximity => SensorPayload::Proximity(raw.distance()),
        SensorKind::Light => SensorPayload::Light(raw.light()),
    }
}

fn vector(raw: &RawSensorEvent) -> SensorVector {
    let view = raw.vector();
    SensorVector {
        v: view.v,
        status: view.status,
    }
}

/// Each field filled from its own source array
fn uncalibrated(raw: &RawSensorEvent) -> UncalibratedVector {
    let view = raw.uncalibrated();
    UncalibratedVector {
        x: view.uncalib[0],
        y: view.uncalib[1],
        z: view.uncalib[2],
        bias_x: view.bias[0],
        bias_y: view.bias[1],
        bias_z: view.bias[2],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::type_tag;

    #[test]
    fn test_header_copied_verbatim() {
        let mut raw = RawSensorEvent::new(type_tag::GYROSCOPE, 9, 123_456_789);
        raw.version = 7;

        let event = translate_event(&raw).unwrap();
        assert_eq!(event.source, EventSource::Android);
        assert_eq!(event.version, 7);
        assert_eq!(event.sensor, 9);
        assert_eq!(event.sensor_type, type_tag::GYROSCOPE);
        assert_eq!(event.timestamp, 123_456_789);
    }

    #[test]
    fn test_vector_kinds() {
        let raw = RawSensorEvent::new(type_tag::ACCELEROMETER, 15, 0)
            .with_vector([1.0, 2.0, 3.0], 3);
        assert_eq!(
            translate_event(&raw).unwrap().payload,
            SensorPayload::Acceleration(SensorVector {
                v: [1.0, 2.0, 3.0],
                status: 3
            })
        );

        let raw = RawSensorEvent::new(type_tag::MAGNETIC_FIELD, 13, 0)
            .with_vector([4.0, 5.0, 6.0], 2);
        assert_eq!(
            translate_event(&raw).unwrap().payload,
            SensorPayload::Magnetic(SensorVector {
                v: [4.0, 5.0, 6.0],
                status: 2
            })
        );

        let raw = RawSensorEvent::new(type_tag::GYROSCOPE, 9, 0).with_vector([0.1, 0.2, 0.3], 1);
        assert!(matches!(
            translate_event(&raw).unwrap().payload,
            SensorPayload::Gyro(SensorVector { status: 1, .. })
        ));
    }

    #[test]
    fn test_uncalibrated_layout() {
        let raw = RawSensorEvent::new(type_tag::GYROSCOPE_UNCALIBRATED, 8, 0)
            .with_uncalibrated([1.0, 2.0, 3.0], [0.1, 0.2, 0.3]);

        match translate_event(&raw).unwrap().payload {
            SensorPayload::GyroUncalibrated(v) => {
                assert_eq!(v.to_array(), [1.0, 2.0, 3.0, 0.1, 0.2, 0.3]);
            }
            other => panic!("unexpected payload: {other:?}"),
        }

        let raw = RawSensorEvent::new(type_tag::MAGNETIC_FIELD_UNCALIBRATED, 3, 0)
            .with_uncalibrated([10.0, 20.0, 30.0], [-1.0, -2.0, -3.0]);
        match translate_event(&raw).unwrap().payload {
            SensorPayload::MagneticUncalibrated(v) => {
                assert_eq!((v.x, v.bias_z), (10.0, -3.0));
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn test_scalar_kinds() {
        let raw = RawSensorEvent::new(type_tag::PROXIMITY, 0, 0).with_scalar(5.0);
        assert_eq!(translate_event(&raw).unwrap().payload, SensorPayload::Proximity(5.0));

        let raw = RawSensorEvent::new(type_tag::LIGHT, 14, 0).with_scalar(500.0);
        assert_eq!(translate_event(&raw).unwrap().payload, SensorPayload::Light(500.0));
    }

    #[test]
    fn test_every_kind_maps_to_its_own_payload() {
        for kind in SensorKind::ALL {
            let raw = RawSensorEvent::new(kind.type_tag(), 1, 0);
            assert_eq!(translate(&raw, kind).payload.kind(), kind);
        }
    }

    #[test]
    fn test_unrecognized_tags_produce_nothing() {
        for tag in [0, 999, type_tag::ADDITIONAL_INFO, type_tag::ACCELEROMETER_UNCALIBRATED] {
            assert!(translate_event(&RawSensorEvent::new(tag, 1, 0)).is_none());
        }
    }
}
