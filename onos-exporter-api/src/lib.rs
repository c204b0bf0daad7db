//! Wire contracts consumed by the ONOS exporter.
//!
//! The upstream services are treated as opaque request/response contracts;
//! only the messages and fields the exporter reads are declared here:
//!
//! - [`onos::e2t::e2::v1beta1`] - e2t subscription admin service
//! - [`onos::topo`] - topology store
//! - [`perftools::profiles`] - pprof profile payloads

pub mod onos {
    pub mod e2t {
        pub mod e2 {
            pub mod v1beta1 {
                tonic::include_proto!("onos.e2t.e2.v1beta1");
            }
        }
    }

    pub mod topo {
        tonic::include_proto!("onos.topo");
    }
}

pub mod perftools {
    pub mod profiles {
        tonic::include_proto!("perftools.profiles");
    }
}

pub use onos::e2t::e2::v1beta1 as e2t;
pub use onos::topo;
pub use perftools::profiles as pprof;
