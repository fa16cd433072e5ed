//! Solidity interface of the deployed logistics contract.
//!
//! This is the single place the on-chain encoding is declared. Status values
//! travel as `uint8` and are lifted into [`crate::models::ShipmentStatus`],
//! so an unexpected discriminant never fails decoding.

use alloy_sol_types::sol;

sol! {
    interface ILogistics {
        struct Shipment {
            string shipmentCode;
            string productName;
            string origin;
            string destination;
            uint8 currentStatus;
            address creator;
            address carrier;
            uint256 createdAt;
            uint256 deadline;
            uint256 depositAmount;
            bool isReleased;
            bool isRefunded;
            bool isRated;
            uint8 rating;
            string feedback;
        }

        struct ShipmentEvent {
            string location;
            string eventType;
            uint256 timestamp;
            address updatedBy;
        }

        struct StatusChange {
            uint8 oldStatus;
            uint8 newStatus;
            uint256 timestamp;
            address changedBy;
            string note;
        }

        function createShipment(
            string shipmentCode,
            string productName,
            string origin,
            string destination,
            address carrier,
            uint256 deadline
        ) external payable;

        function getShipment(string shipmentCode) external view returns (Shipment memory);

        function getShipmentEvents(string shipmentCode) external view returns (ShipmentEvent[] memory);

        function getStatusHistory(string shipmentCode) external view returns (StatusChange[] memory);

        function addShipmentEvent(string shipmentCode, string location, string eventType) external;

        function updateShipmentStatus(string shipmentCode, uint8 newStatus, string note) external;

        function rateCarrier(string shipmentCode, uint8 rating, string feedback) external;

        function getCarrierAverageRating(address carrier) external view returns (uint256);

        function carrierStats(address carrier) external view returns (uint256 totalRating, uint256 ratingCount);

        function isEscrowReleased(string shipmentCode)
            external
            view
            returns (bool released, bool refunded, uint256 depositAmount);
    }
}
