//! Topology aspect payloads.
//!
//! Aspects arrive as `google.protobuf.Any` values whose bytes hold the JSON
//! encoding of the aspect message. Field names may be camelCase or
//! snake_case and enums may be encoded as names or numbers.

use serde::Deserialize;

use crate::error::Result;

/// Substring identifying slice list aspects by type name.
pub const RSM_SLICE_ITEM_LIST: &str = "RSMSliceItemList";

const SCHEDULER_TYPES: &[&str] = &[
    "RSM_SCHEDULER_TYPE_ROUND_ROBIN",
    "RSM_SCHEDULER_TYPE_PROPORTIONALLY_FAIR",
    "RSM_SCHEDULER_TYPE_QOS_BASED",
];

const SLICE_TYPES: &[&str] = &["RSM_SLICE_TYPE_DL_SLICE", "RSM_SLICE_TYPE_UL_SLICE"];

const UE_ID_TYPES: &[&str] = &[
    "UE_ID_TYPE_CU_UE_F1_AP_ID",
    "UE_ID_TYPE_DU_UE_F1_AP_ID",
    "UE_ID_TYPE_RAN_UE_NGAP_ID",
    "UE_ID_TYPE_AMF_UE_NGAP_ID",
    "UE_ID_TYPE_ENB_UE_S1_AP_ID",
];

/// Whether an aspect type name designates a slice list.
pub fn is_slice_list(aspect_type: &str) -> bool {
    aspect_type.contains(RSM_SLICE_ITEM_LIST)
}

/// Decode a slice list aspect payload.
pub fn decode_slice_list(payload: &[u8]) -> Result<RsmSliceItemList> {
    Ok(serde_json::from_slice(payload)?)
}

/// Slices configured on one E2 node.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RsmSliceItemList {
    #[serde(alias = "rsm_slice_list")]
    pub rsm_slice_list: Vec<RsmSlicingItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RsmSlicingItem {
    pub id: String,
    #[serde(alias = "slice_desc")]
    pub slice_desc: String,
    #[serde(alias = "slice_parameters")]
    pub slice_parameters: Option<RsmSliceParameters>,
    #[serde(alias = "slice_type")]
    pub slice_type: EnumValue,
    #[serde(alias = "ue_id_list")]
    pub ue_id_list: Vec<UeIdentity>,
}

impl RsmSlicingItem {
    pub fn scheduler_type(&self) -> String {
        self.slice_parameters
            .as_ref()
            .map(|p| p.scheduler_type.name(SCHEDULER_TYPES))
            .unwrap_or_else(|| EnumValue::default().name(SCHEDULER_TYPES))
    }

    pub fn weight(&self) -> String {
        self.slice_parameters
            .as_ref()
            .map(|p| p.weight.to_string())
            .unwrap_or_else(|| "0".to_string())
    }

    pub fn qos_level(&self) -> String {
        self.slice_parameters
            .as_ref()
            .map(|p| p.qos_level.to_string())
            .unwrap_or_else(|| "0".to_string())
    }

    pub fn slice_type(&self) -> String {
        self.slice_type.name(SLICE_TYPES)
    }

    /// One descriptor per UE, joined with commas.
    pub fn ue_id_list(&self) -> String {
        self.ue_id_list
            .iter()
            .map(UeIdentity::describe)
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RsmSliceParameters {
    #[serde(alias = "scheduler_type")]
    pub scheduler_type: EnumValue,
    pub weight: NumberValue,
    #[serde(alias = "qos_level")]
    pub qos_level: NumberValue,
}

/// The identifiers a UE is known by across RAN interfaces.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UeIdentity {
    #[serde(alias = "cu_ue_f1ap_id")]
    pub cu_ue_f1ap_id: Option<IdValue>,
    #[serde(alias = "du_ue_f1ap_id")]
    pub du_ue_f1ap_id: Option<IdValue>,
    #[serde(alias = "ran_ue_ngap_id")]
    pub ran_ue_ngap_id: Option<IdValue>,
    #[serde(alias = "amf_ue_ngap_id")]
    pub amf_ue_ngap_id: Option<IdValue>,
    #[serde(alias = "enb_ue_s1ap_id")]
    pub enb_ue_s1ap_id: Option<IdValue>,
    #[serde(alias = "preferred_id_type")]
    pub preferred_id_type: EnumValue,
}

impl UeIdentity {
    /// `PreferredIDType=..,AMFUeNgapID=..,CuUeF1apID=..,DuUeF1apID=..,EnbUeS1apID=..,RANUeNgapID=..`
    ///
    /// Absent identifiers render as empty values.
    pub fn describe(&self) -> String {
        format!(
            "PreferredIDType={},AMFUeNgapID={},CuUeF1apID={},DuUeF1apID={},EnbUeS1apID={},RANUeNgapID={}",
            self.preferred_id_type.name(UE_ID_TYPES),
            id_value(&self.amf_ue_ngap_id),
            id_value(&self.cu_ue_f1ap_id),
            id_value(&self.du_ue_f1ap_id),
            id_value(&self.enb_ue_s1ap_id),
            id_value(&self.ran_ue_ngap_id),
        )
    }
}

fn id_value(id: &Option<IdValue>) -> String {
    id.as_ref().map(|v| v.value.to_string()).unwrap_or_default()
}

/// A wrapped identifier, `{ "value": n }`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct IdValue {
    pub value: NumberValue,
}

/// Integer field; 64-bit integers are JSON-encoded as strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumberValue {
    Int(i64),
    Text(String),
}

impl Default for NumberValue {
    fn default() -> Self {
        Self::Int(0)
    }
}

impl std::fmt::Display for NumberValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{}", v),
            Self::Text(v) => f.write_str(v),
        }
    }
}

/// Enum field encoded as its symbolic name or its number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum EnumValue {
    Number(i64),
    Name(String),
}

impl Default for EnumValue {
    fn default() -> Self {
        Self::Number(0)
    }
}

impl EnumValue {
    /// Symbolic name; numbers outside `names` render as decimal.
    fn name(&self, names: &[&str]) -> String {
        match self {
            Self::Name(name) => name.clone(),
            Self::Number(n) => usize::try_from(*n)
                .ok()
                .and_then(|i| names.get(i))
                .map(|name| name.to_string())
                .unwrap_or_else(|| n.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExporterError;

    const CAMEL_CASE: &str = r#"{
        "rsmSliceList": [{
            "id": "1",
            "sliceDesc": "video",
            "sliceParameters": {
                "schedulerType": "RSM_SCHEDULER_TYPE_PROPORTIONALLY_FAIR",
                "weight": 30,
                "qosLevel": 2
            },
            "sliceType": "RSM_SLICE_TYPE_UL_SLICE",
            "ueIdList": [{
                "cuUeF1apId": { "value": "11" },
                "duUeF1apId": { "value": "12" },
                "ranUeNgapId": { "value": "13" },
                "amfUeNgapId": { "value": "14" },
                "enbUeS1apId": { "value": 15 },
                "preferredIdType": "UE_ID_TYPE_DU_UE_F1_AP_ID"
            }]
        }]
    }"#;

    #[test]
    fn test_is_slice_list() {
        assert!(is_slice_list("onos.topo.RSMSliceItemList"));
        assert!(!is_slice_list("onos.topo.E2Node"));
    }

    #[test]
    fn test_decode_camel_case() {
        let list = decode_slice_list(CAMEL_CASE.as_bytes()).unwrap();
        assert_eq!(list.rsm_slice_list.len(), 1);

        let item = &list.rsm_slice_list[0];
        assert_eq!(item.id, "1");
        assert_eq!(item.slice_desc, "video");
        assert_eq!(item.scheduler_type(), "RSM_SCHEDULER_TYPE_PROPORTIONALLY_FAIR");
        assert_eq!(item.weight(), "30");
        assert_eq!(item.qos_level(), "2");
        assert_eq!(item.slice_type(), "RSM_SLICE_TYPE_UL_SLICE");
        assert_eq!(
            item.ue_id_list(),
            "PreferredIDType=UE_ID_TYPE_DU_UE_F1_AP_ID,AMFUeNgapID=14,CuUeF1apID=11,\
             DuUeF1apID=12,EnbUeS1apID=15,RANUeNgapID=13"
        );
    }

    #[test]
    fn test_decode_snake_case_and_numeric_enums() {
        let payload = r#"{
            "rsm_slice_list": [{
                "id": "2",
                "slice_desc": "voice",
                "slice_parameters": { "scheduler_type": 2, "weight": 10, "qos_level": 1 },
                "slice_type": 1,
                "ue_id_list": [{ "ran_ue_ngap_id": { "value": 7 }, "preferred_id_type": 2 }]
            }]
        }"#;

        let list = decode_slice_list(payload.as_bytes()).unwrap();
        let item = &list.rsm_slice_list[0];

        assert_eq!(item.scheduler_type(), "RSM_SCHEDULER_TYPE_QOS_BASED");
        assert_eq!(item.slice_type(), "RSM_SLICE_TYPE_UL_SLICE");
        assert_eq!(
            item.ue_id_list(),
            "PreferredIDType=UE_ID_TYPE_RAN_UE_NGAP_ID,AMFUeNgapID=,CuUeF1apID=,\
             DuUeF1apID=,EnbUeS1apID=,RANUeNgapID=7"
        );
    }

    #[test]
    fn test_omitted_fields_take_proto_defaults() {
        let list = decode_slice_list(br#"{ "rsmSliceList": [{ "id": "3" }] }"#).unwrap();
        let item = &list.rsm_slice_list[0];

        assert_eq!(item.scheduler_type(), "RSM_SCHEDULER_TYPE_ROUND_ROBIN");
        assert_eq!(item.slice_type(), "RSM_SLICE_TYPE_DL_SLICE");
        assert_eq!(item.weight(), "0");
        assert_eq!(item.ue_id_list(), "");
    }

    #[test]
    fn test_multiple_ues_one_segment_each() {
        let payload = r#"{ "rsmSliceList": [{ "id": "4", "ueIdList": [
            { "duUeF1apId": { "value": 1 } },
            { "duUeF1apId": { "value": 2 } }
        ] }] }"#;

        let list = decode_slice_list(payload.as_bytes()).unwrap();
        let ues = list.rsm_slice_list[0].ue_id_list();

        assert_eq!(ues.matches("PreferredIDType=").count(), 2);
        assert!(ues.contains("DuUeF1apID=1,"));
        assert!(ues.contains("DuUeF1apID=2,"));
    }

    #[test]
    fn test_unknown_enum_number() {
        assert_eq!(EnumValue::Number(9).name(SLICE_TYPES), "9");
        assert_eq!(EnumValue::Number(-1).name(SLICE_TYPES), "-1");
    }

    #[test]
    fn test_malformed_payload() {
        let result = decode_slice_list(b"not json");
        assert!(matches!(result, Err(ExporterError::Decode(_))));
    }
}
